use std::time::Duration;

use crate::errors::WebDavError;

use super::path::MOUNT_PREFIX;

/// Username the homeserver expects alongside the admin token.
pub const ADMIN_USERNAME: &str = "admin";

/// WebDAV client configuration
#[derive(Debug, Clone)]
pub struct WebDavClientConfig {
    /// Every request goes to `base_url + path`.
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Send PROPFIND/MKCOL/MOVE/COPY as POST with `X-HTTP-Method-Override`.
    pub method_override: bool,
    /// `None` keeps the transport default.
    pub timeout_seconds: Option<u64>,
    /// Base for MOVE/COPY `Destination` URLs when it differs from `base_url`,
    /// e.g. the upstream mount while requests go through the proxy.
    pub destination_base: Option<String>,
}

impl WebDavClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            method_override: false,
            timeout_seconds: None,
            destination_base: None,
        }
    }

    /// Direct connection to a homeserver's `/dav` mount with the admin token.
    pub fn for_homeserver(server_url: &str, token: &str) -> Self {
        Self::new(format!("{}{}", server_url.trim_end_matches('/'), MOUNT_PREFIX))
            .with_credentials(ADMIN_USERNAME, token)
    }

    /// Connection through the dashboard's proxy route, which adds credentials itself.
    pub fn via_proxy(proxy_url: &str) -> Self {
        let mut config = Self::new(proxy_url.trim_end_matches('/'));
        config.method_override = true;
        config
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: Option<u64>) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), WebDavError> {
        if self.base_url.trim().is_empty() {
            return Err(WebDavError::configuration("base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(WebDavError::configuration(
                "base URL must start with http:// or https://",
            ));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(WebDavError::configuration(
                "username and password must be set together",
            ));
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Absolute URL for a mount-relative path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base(), path)
        } else {
            format!("{}/{}", self.base(), path)
        }
    }

    /// Absolute `Destination` URL for a mount-relative path.
    pub fn destination_for(&self, path: &str) -> String {
        match self.destination_base.as_deref() {
            Some(base) => WebDavClientConfig::new(base).url_for(path),
            None => self.url_for(path),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
