use anyhow::Result;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: String,
    /// Homeserver base URL; the WebDAV mount lives under `/dav/`.
    pub webdav_base_url: Option<String>,
    pub admin_token: Option<String>,
    pub webdav_timeout_seconds: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_address: env::var("SERVER_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            webdav_base_url: non_empty_var("HOMESERVER_WEBDAV_URL"),
            admin_token: non_empty_var("HOMESERVER_ADMIN_TOKEN"),
            webdav_timeout_seconds: env::var("WEBDAV_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok()),
        })
    }

    /// Presence flags for error payloads. Never carries the token itself.
    pub fn diagnostics(&self) -> ConfigDiagnostics {
        ConfigDiagnostics {
            has_base_url: self.webdav_base_url.is_some(),
            has_token: self.admin_token.is_some(),
        }
    }

    /// Both upstream settings, or `None` when either is missing.
    pub fn upstream(&self) -> Option<(&str, &str)> {
        match (self.webdav_base_url.as_deref(), self.admin_token.as_deref()) {
            (Some(url), Some(token)) => Some((url, token)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDiagnostics {
    pub has_base_url: bool,
    pub has_token: bool,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
