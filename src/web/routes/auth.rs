use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};

use crate::{
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreate},
    },
    web::{
        AppState, AuthenticatedUser, Payload, RequestContext, WebError, WebResult,
        dto::auth::{AuthResponse, LoginBody, RegisterBody},
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/me", get(auth_me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .route("/register", post(auth_register_handler))
        .route("/login", post(auth_login_handler))
        .route("/logout", post(auth_logout_handler))
        .with_state(state)
}

/// Signs a token for `user` and stores it in the session cookie.
fn issue_token(state: &AppState, cookies: &Cookies, user: &UserEntity) -> WebResult<String> {
    let claims = UserClaims::new(user.id(), user.role());
    let token = auth::generate_token(claims, state.config().app().jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token.clone());
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(Duration::hours(auth::TOKEN_TTL_HOURS));
    cookies.add(cookie);

    Ok(token)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterBody,
    description = "Creates a new student or teacher account and signs it in",
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub(crate) async fn auth_register_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Payload(payload): Payload<RegisterBody>,
) -> WebResult<impl IntoResponse> {
    let registration = payload.validate()?;
    let system = AuthenticatedUser::admin();

    let by_name = UserEntity::find_by_username(state.pool(), &system, &registration.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    if by_name.is_some() {
        return Err(WebError::registration_conflict());
    }

    let by_email = UserEntity::find_by_email(state.pool(), &system, &registration.email)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    if by_email.is_some() {
        return Err(WebError::registration_email_conflict());
    }

    let hash = hash_password(&registration.password).map_err(WebError::server_crypt_error)?;
    let created = UserEntity::create_with_role(
        state.pool(),
        &system,
        UserEntityCreate {
            username: registration.username,
            email: registration.email,
            password_hash: hash,
        },
        registration.role,
    )
    .await
    .map_err(|e| {
        // lost a race against a concurrent registration
        if e.is_unique_violation() {
            WebError::registration_conflict()
        } else {
            WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
        }
    })?;

    tracing::info!("registered {} `{}`", created.role(), created.username());
    let token = issue_token(&state, &cookies, &created)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: created,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    description = "Authorizes user in the system",
    responses(
        (status = 200, description = "User signed in", body = AuthResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub(crate) async fn auth_login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Payload(payload): Payload<LoginBody>,
) -> WebResult<impl IntoResponse> {
    let (username, password) = payload.validate()?;

    let found = UserEntity::find_by_username(state.pool(), &AuthenticatedUser::admin(), &username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified =
        verify_password(found.hash(), &password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    let token = issue_token(&state, &cookies, &found)?;
    Ok((StatusCode::OK, Json(AuthResponse { token, user: found })))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    description = "Removes the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "auth"
)]
pub(crate) async fn auth_logout_handler(cookies: Cookies) -> impl IntoResponse {
    middlewares::drop_session_cookie(&cookies);
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    description = "Currently signed in user",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "auth"
)]
pub(crate) async fn auth_me_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_required)?;

    Ok((StatusCode::OK, Json(found)))
}
