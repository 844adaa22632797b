use serde::Deserialize;

use crate::web::dto::required;
use crate::web::{UserRole, WebError, WebResult};

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RoleUpdateBody {
    /// `student`, `teacher` or `admin`
    pub role: Option<String>,
}

impl RoleUpdateBody {
    pub fn validate(self) -> WebResult<UserRole> {
        required("role", self.role)?
            .parse()
            .map_err(|reason| WebError::validation_invalid("role", reason))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_must_be_known() {
        let body = RoleUpdateBody {
            role: Some(String::from("Admin")),
        };
        assert_eq!(body.validate().unwrap(), UserRole::Admin);

        let body = RoleUpdateBody {
            role: Some(String::from("owner")),
        };
        assert!(body.validate().is_err());
        assert!(RoleUpdateBody::default().validate().is_err());
    }
}
