use axum::http::StatusCode;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::AppError;
use crate::config::ConfigDiagnostics;

/// Failures surfaced by the WebDAV client.
///
/// Every variant maps to a numeric `status()`: `0` for local and transport
/// failures, the upstream HTTP status otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebDavError {
    #[error("WebDAV is not configured: {message}")]
    Configuration { message: String },

    #[error("Request to '{url}' failed: {message}")]
    Network { url: String, message: String },

    #[error("WebDAV request failed: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid multistatus response: {message}")]
    Parse { message: String },
}

impl WebDavError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub(crate) fn network(url: &str, err: &reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Builds the upstream error from a non-2xx status, e.g. `"404 Not Found"`.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        Self::Upstream {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            WebDavError::Upstream { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WebDavError::Configuration { message }
            | WebDavError::Network { message, .. }
            | WebDavError::Upstream { message, .. }
            | WebDavError::Parse { message } => message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }
}

impl AppError for WebDavError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebDavError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            WebDavError::Network { .. } | WebDavError::Parse { .. } => StatusCode::BAD_GATEWAY,
            WebDavError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            WebDavError::Network { .. } => "Could not reach the WebDAV server".to_string(),
            other => other.message().to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WebDavError::Configuration { .. } => "WEBDAV_NOT_CONFIGURED",
            WebDavError::Network { .. } => "WEBDAV_UNREACHABLE",
            WebDavError::Upstream { .. } => "WEBDAV_UPSTREAM_ERROR",
            WebDavError::Parse { .. } => "WEBDAV_INVALID_RESPONSE",
        }
    }
}

impl_into_response!(WebDavError);

/// Failures produced by the WebDAV proxy route itself.
///
/// Upstream error statuses are relayed verbatim and never become a `ProxyError`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("WebDAV proxy is not configured")]
    NotConfigured { diagnostics: ConfigDiagnostics },

    #[error("Upstream request to '{url}' failed: {message}")]
    Network {
        url: String,
        message: String,
        diagnostics: ConfigDiagnostics,
    },

    #[error("Invalid method override '{method}'")]
    InvalidMethod { method: String },
}

impl AppError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NotConfigured { .. } | ProxyError::Network { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::InvalidMethod { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ProxyError::NotConfigured { .. } => {
                "WebDAV proxy is not configured: set HOMESERVER_WEBDAV_URL and HOMESERVER_ADMIN_TOKEN"
                    .to_string()
            }
            ProxyError::Network { message, .. } => {
                format!("Failed to reach WebDAV server: {}", message)
            }
            other => other.to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProxyError::NotConfigured { .. } => "PROXY_NOT_CONFIGURED",
            ProxyError::Network { .. } => "PROXY_NETWORK_ERROR",
            ProxyError::InvalidMethod { .. } => "PROXY_INVALID_METHOD",
        }
    }

    fn details(&self) -> Option<Map<String, Value>> {
        let mut details = Map::new();
        match self {
            ProxyError::NotConfigured { diagnostics } => {
                details.insert("config".to_string(), json!(diagnostics));
            }
            ProxyError::Network { url, diagnostics, .. } => {
                details.insert("url".to_string(), json!(url));
                details.insert("config".to_string(), json!(diagnostics));
            }
            _ => return None,
        }
        Some(details)
    }
}

impl_into_response!(ProxyError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_zero_for_local_failures() {
        assert_eq!(WebDavError::configuration("no base url").status(), 0);
        let network = WebDavError::Network {
            url: "http://localhost/dav/".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(network.status(), 0);
    }

    #[test]
    fn test_upstream_message_combines_code_and_reason() {
        let err = WebDavError::from_status(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "404 Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_proxy_network_details_include_url_and_config() {
        let err = ProxyError::Network {
            url: "http://localhost:6286/dav/".to_string(),
            message: "connection refused".to_string(),
            diagnostics: ConfigDiagnostics {
                has_base_url: true,
                has_token: true,
            },
        };
        let details = err.details().unwrap();
        assert_eq!(details["url"], "http://localhost:6286/dav/");
        assert_eq!(details["config"]["hasToken"], true);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
