use serde::{Deserialize, Serialize};

use crate::web::WebResult;
use crate::web::dto::auth::check_email;
use crate::web::dto::courses::EnrolledCourseResponse;
use crate::web::dto::non_blank;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UserUpdateBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Checked profile patch; the password is still in clear text.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdateBody {
    pub fn validate(self) -> WebResult<ProfileUpdate> {
        let email = non_blank("email", self.email)?.map(|e| e.trim().to_lowercase());
        if let Some(email) = &email {
            check_email(email)?;
        }

        Ok(ProfileUpdate {
            username: non_blank("username", self.username)?.map(|u| u.trim().to_string()),
            email,
            password: non_blank("password", self.password)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub user: uuid::Uuid,
    pub courses_enrolled: usize,
    pub lessons_completed: usize,
    pub courses: Vec<EnrolledCourseResponse>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_patch_is_valid() {
        let update = UserUpdateBody::default().validate().unwrap();
        assert!(update.username.is_none() && update.email.is_none() && update.password.is_none());
    }

    #[test]
    fn patch_rejects_blank_username() {
        let body = UserUpdateBody {
            username: Some(String::from("  ")),
            ..Default::default()
        };
        assert!(body.validate().is_err());
    }
}
