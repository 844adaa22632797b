//! Role requirements for routes. Every role check in the web layer goes through
//! [`Policy::authorize`]; resource ownership is checked separately with
//! [`crate::model::check_access`].

use crate::model::ResourceType;
use crate::web::{AuthenticatedUser, RequestContext, UserRole, WebError, WebResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Any signed-in user.
    Authenticated,
    /// Teachers and admins.
    Staff,
    /// Admins only.
    Admin,
}

impl Policy {
    pub fn allows(&self, role: UserRole) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Staff => role.is_staff(),
            Self::Admin => role == UserRole::Admin,
        }
    }

    /// Anonymous requests fail with 401, insufficient roles with 403 on `resource`.
    pub fn authorize<'a>(
        &self,
        ctx: &'a RequestContext,
        resource: ResourceType,
    ) -> WebResult<&'a AuthenticatedUser> {
        let user = ctx.user()?;
        if self.allows(user.user_role()) {
            Ok(user)
        } else {
            Err(WebError::resource_forbidden(resource))
        }
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use uuid::Uuid;

    use super::*;

    fn ctx(role: UserRole) -> RequestContext {
        RequestContext::new(Some(AuthenticatedUser::new(Uuid::new_v4(), role)))
    }

    #[test]
    fn staff_policy() {
        assert!(Policy::Staff.authorize(&ctx(UserRole::Teacher), ResourceType::Lesson).is_ok());
        assert!(Policy::Staff.authorize(&ctx(UserRole::Admin), ResourceType::Lesson).is_ok());

        let err = Policy::Staff
            .authorize(&ctx(UserRole::Student), ResourceType::Lesson)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_policy_rejects_teachers() {
        let err = Policy::Admin
            .authorize(&ctx(UserRole::Teacher), ResourceType::User)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn anonymous_is_unauthorized_not_forbidden() {
        let anonymous = RequestContext::new(None);
        for policy in [Policy::Authenticated, Policy::Staff, Policy::Admin] {
            let err = policy.authorize(&anonymous, ResourceType::Course).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
