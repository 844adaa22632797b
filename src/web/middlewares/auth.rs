use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies};

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Token from the `SID` cookie, or else from an `Authorization: Bearer` header.
fn find_token(cookies: &Cookies, req: &Request) -> Option<(&'static str, String)> {
    if let Some(cookie) = cookies.get(AUTH_TOKEN) {
        return Some((AUTH_TOKEN, cookie.value().to_string()));
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| ("Authorization", token.trim().to_string()))
}

/// Resolves the requester and stores a [`RequestContext`] in the request
/// extensions. Requests without a usable token pass through anonymously; a
/// stale session cookie is dropped on the way.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let user = match find_token(&cookies, &req) {
        Some((source, token)) => resolve_user(&state, &cookies, source, &token).await?,
        None => None,
    };

    req.extensions_mut().insert(RequestContext::new(user));
    Ok(next.run(req).await)
}

async fn resolve_user(
    state: &AppState,
    cookies: &Cookies,
    source: &'static str,
    token: &str,
) -> Result<Option<AuthenticatedUser>, WebError> {
    let id = match auth::process_token(token, state.config().app().jwt())
        .ok()
        .and_then(|data| data.claims.sub.parse::<uuid::Uuid>().ok())
    {
        Some(id) => id,
        None => {
            tracing::debug!("ignoring invalid or expired token from {}", source);
            if source == AUTH_TOKEN {
                drop_session_cookie(cookies);
            }
            return Ok(None);
        }
    };

    // role comes from the database so demotions apply to live tokens
    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    match found {
        Some(user) => Ok(Some(AuthenticatedUser::new(id, user.role()))),
        None => {
            tracing::debug!("token subject {} no longer exists", id);
            Ok(None)
        }
    }
}

pub fn drop_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
}
