pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod webdav_xml_parser;

use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use config::Config;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared transport for the proxy route.
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.webdav_timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(seconds));
        }

        Ok(AppState {
            config,
            http_client: builder.build()?,
        })
    }
}

/// Health check endpoint for monitoring
pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({"status": "ok"})))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/files", routes::files::router())
        .merge(routes::webdav::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
