use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: uuid::Uuid, role: impl ToString) -> Self {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp();
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp,
        }
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_carries_subject_and_role() {
        let id = uuid::Uuid::new_v4();
        let token = generate_token(UserClaims::new(id, "teacher"), "key").unwrap();
        let data = process_token(&token, "key").unwrap();
        assert_eq!(data.claims.sub, id.to_string());
        assert_eq!(data.claims.role, "teacher");
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = generate_token(UserClaims::new(uuid::Uuid::new_v4(), "student"), "key").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = UserClaims {
            sub: uuid::Uuid::new_v4().to_string(),
            role: String::from("student"),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };
        let token = generate_token(claims, "key").unwrap();
        assert!(process_token(&token, "key").is_err());
    }
}
