use axum::{extract::Request, middleware::Next, response::Response};

use crate::{
    model::ResourceType,
    web::{Policy, RequestContext, error::WebError},
};

/// Gate for the whole admin area. Must run after `extract_context_fn`.
pub async fn require_admin_fn(req: Request, next: Next) -> Result<Response, WebError> {
    let ctx = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| RequestContext::new(None));

    Policy::Admin.authorize(&ctx, ResourceType::User)?;
    Ok(next.run(req).await)
}
