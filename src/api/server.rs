//! HTTP API server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthSession, FileSessionStore, MemoryDirectory, MemorySessionStore, SessionStore};
use crate::config::{Config, SessionBackend};
use crate::error::Result;

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub auth: AuthSession,
}

pub type SharedState = Arc<AppState>;

/// Build the session store selected by configuration
pub fn build_session_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    let expiry = config.sessions.expiry_minutes;
    match config.sessions.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new(expiry))),
        SessionBackend::File => Ok(Arc::new(FileSessionStore::new(
            config.sessions.dir.clone(),
            expiry,
        )?)),
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let sessions = build_session_store(&config)?;
    let directory = Arc::new(MemoryDirectory::from_entries(
        &config.auth.password_field,
        &config.users,
    ));
    let auth = AuthSession::new(config.auth.clone(), sessions, directory);

    let state = Arc::new(AppState { config, auth });

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
fn create_router(state: SharedState) -> Router {
    Router::new()
        // API routes
        .route("/api/health", get(routes::health))
        .route("/api/session", post(routes::create_session))
        .route("/api/login", post(routes::login))
        .route("/api/logout", post(routes::logout))
        .route("/api/me", get(routes::me))
        .route("/api/restricted", post(routes::restricted))
        // UI routes
        .route(
            "/login",
            get(crate::ui::login_form).post(crate::ui::login_submit),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
