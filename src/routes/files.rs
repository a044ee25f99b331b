use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    errors::WebDavError,
    models::{Depth, WebDavListing},
    services::webdav::{WebDavClient, WebDavClientConfig},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_files))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub depth: Depth,
}

fn default_path() -> String {
    "/".to_string()
}

/// Client aimed at the configured homeserver, rebuilt per call so config
/// problems surface on every request.
pub fn homeserver_client(state: &AppState) -> Result<WebDavClient, WebDavError> {
    let (base_url, token) = state.config.upstream().ok_or_else(|| {
        WebDavError::configuration("HOMESERVER_WEBDAV_URL and HOMESERVER_ADMIN_TOKEN must be set")
    })?;

    WebDavClient::new(
        WebDavClientConfig::for_homeserver(base_url, token)
            .with_timeout(state.config.webdav_timeout_seconds),
    )
}

async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<WebDavListing>, WebDavError> {
    info!("Listing {} (depth {})", query.path, query.depth);

    let client = homeserver_client(&state)?;
    let listing = client.list_directory(&query.path, query.depth).await?;
    Ok(Json(listing))
}
