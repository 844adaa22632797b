use serde::{Deserialize, Serialize};

use crate::model::entity::UserEntity;
use crate::web::dto::{required, required_trimmed};
use crate::web::{UserRole, WebError, WebResult};

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `student` (default) or `teacher`
    pub role: Option<String>,
}

/// Checked registration input, password still in clear text.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

pub(crate) fn check_email(email: &str) -> WebResult<()> {
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(WebError::validation_invalid("email", "must be an email address")),
    }
}

impl RegisterBody {
    pub fn validate(self) -> WebResult<Registration> {
        let username = required_trimmed("username", self.username)?;
        let email = required_trimmed("email", self.email)?.to_lowercase();
        check_email(&email)?;
        let password = required("password", self.password)?;

        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => UserRole::Student,
            Some(role) => role
                .parse::<UserRole>()
                .map_err(|reason| WebError::validation_invalid("role", reason))?,
        };
        if role == UserRole::Admin {
            return Err(WebError::validation_invalid(
                "role",
                "can not be chosen at registration",
            ));
        }

        Ok(Registration {
            username,
            email,
            password,
            role,
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginBody {
    pub fn validate(self) -> WebResult<(String, String)> {
        Ok((
            required_trimmed("username", self.username)?,
            required("password", self.password)?,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserEntity,
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;

    use super::*;

    fn body(role: Option<&str>) -> RegisterBody {
        RegisterBody {
            username: Some(String::from("alice")),
            email: Some(String::from("Alice@Example.com")),
            password: Some(String::from("hunter2")),
            role: role.map(String::from),
        }
    }

    #[test]
    fn registration_defaults_to_student() {
        let reg = body(None).validate().unwrap();
        assert_eq!(reg.role, UserRole::Student);
        assert_eq!(reg.email, "alice@example.com");
    }

    #[test]
    fn registration_accepts_teacher() {
        assert_eq!(body(Some("teacher")).validate().unwrap().role, UserRole::Teacher);
    }

    #[test]
    fn registration_rejects_admin_and_unknown_roles() {
        for role in ["admin", "root"] {
            let err = body(Some(role)).validate().unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn registration_rejects_bad_email() {
        let mut b = body(None);
        b.email = Some(String::from("nope"));
        assert!(b.validate().is_err());
    }
}
