use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,

    #[error("RegistrationEmailConflict")]
    RegistrationEmailConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}. Reason: {reason}")]
    ResourceConflict {
        resource_type: ResourceType,
        reason: String,
    },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationMissingField: {field}")]
    ValidationMissingField { field: String },

    #[error("ValidationInvalidField: {field}. Reason: {reason}")]
    ValidationInvalidField { field: String, reason: String },

    #[error("ValidationMalformedBody: {reason}")]
    ValidationMalformedBody { reason: String },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::CONFLICT
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
            Self::RegistrationEmailConflict => {
                String::from("Registration error, email is already in use.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceConflict { reason, .. } => format!("Resource error, conflict: {reason}."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ValidationMissingField { field } => {
                format!("Validation error, field `{field}` is required.")
            }
            Self::ValidationInvalidField { field, reason } => {
                format!("Validation error, field `{field}` {reason}.")
            }
            Self::ValidationMalformedBody { .. } => {
                String::from("Validation error, request body is malformed.")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    /// Maps the outcome of an ownership check: `Forbidden` stays a 403, the rest
    /// is a fetch failure.
    pub fn resource_access_error(r#type: ResourceType, error: DatabaseError) -> Self {
        if let DatabaseError::Forbidden = error {
            Self::resource_forbidden(r#type)
        } else {
            Self::resource_fetch_error(r#type, error)
        }
    }

    pub fn validation_missing<S: Into<String>>(field: S) -> Self {
        Self::ValidationError(ValidationError::ValidationMissingField {
            field: field.into(),
        })
    }

    pub fn validation_invalid<S: Into<String>, R: Into<String>>(field: S, reason: R) -> Self {
        Self::ValidationError(ValidationError::ValidationInvalidField {
            field: field.into(),
            reason: reason.into(),
        })
    }

    pub fn validation_malformed<S: Into<String>>(reason: S) -> Self {
        Self::ValidationError(ValidationError::ValidationMalformedBody {
            reason: reason.into(),
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn registration_email_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationEmailConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        log_error(&self);

        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(
            WebError::resource_not_found(ResourceType::Lesson).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::resource_forbidden(ResourceType::Lesson).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(WebError::validation_missing("title").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WebError::registration_conflict().status_code(), StatusCode::CONFLICT);
        assert_eq!(WebError::auth_required().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn access_error_keeps_forbidden() {
        let e = WebError::resource_access_error(ResourceType::Course, DatabaseError::Forbidden);
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);

        let e = WebError::resource_access_error(
            ResourceType::Course,
            DatabaseError::SqlxError(sqlx::Error::RowNotFound),
        );
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_field_message_names_the_field() {
        let e = WebError::validation_missing("content");
        assert!(e.client_display().contains("`content`"));
    }
}
