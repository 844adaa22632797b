use std::sync::Arc;

use crate::auth::hash_password;
use crate::model::entity::{UserEntity, UserEntityCreate};
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::web::{AuthenticatedUser, UserRole};
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod model;
pub mod utils;
pub mod web;

pub static APPLICATION_NAME: &str = "coursehub";

/// Connects to the database, applies migrations and builds the router.
///
/// A failed connection is returned as an error; the caller is expected to treat
/// it as fatal.
pub async fn build_server(config: Config) -> AppResult<(AppState, Router)> {
    tracing::info!("connecting to database...");
    let db = DbConnection::connect(config.app().database_uri()).await?;
    tracing::info!("database connected");

    tracing::debug!("applying migrations...");
    db.migrate().await?;

    build_server_with_pool(db, config).await
}

/// Same as [`build_server`] but for an already connected (and migrated) pool.
pub async fn build_server_with_pool(db: DbConnection, config: Config) -> AppResult<(AppState, Router)> {
    let mm = ModelManager::new(db);
    let state = AppState::new(mm, Arc::new(config));

    seed_admin(&state).await?;

    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

async fn seed_admin(state: &AppState) -> AppResult<()> {
    let Some(seed) = state.config().app().admin() else {
        return Ok(());
    };

    let actor = AuthenticatedUser::admin();
    if UserEntity::find_by_username(state.pool(), &actor, seed.username())
        .await?
        .is_some()
    {
        return Ok(());
    }

    let created = UserEntity::create_with_role(
        state.pool(),
        &actor,
        UserEntityCreate {
            username: seed.username().to_string(),
            email: seed.email().to_string(),
            password_hash: hash_password(seed.password())?,
        },
        UserRole::Admin,
    )
    .await?;

    tracing::info!("seeded admin account `{}`", created.username());
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn setup_workers(config: Config) -> AppResult<()> {
    let bindto = config.host().bindto().to_string();
    tracing::info!("running in {:?} mode", config.app().environment());
    if config.app().is_production() && config.app().has_default_jwt() {
        tracing::warn!("JWT_SECRET is not set, tokens are signed with the well-known default secret");
    }
    let (_, app) = build_server(config).await?;
    let listener = TcpListener::bind(&bindto).await?;

    tracing::info!("axum is starting at: {}", bindto);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();

    let use_local = cfg!(debug_assertions);
    let config = Config::load(use_local)?;

    setup_workers(config).await?;
    Ok(())
}
