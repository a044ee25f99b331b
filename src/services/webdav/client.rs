use reqwest::{header, Client, Method, RequestBuilder, Response};
use tracing::{debug, info, warn};

use crate::errors::WebDavError;
use crate::models::{Depth, WebDavEntry, WebDavListing};
use crate::webdav_xml_parser::PROPFIND_BODY;

use super::config::WebDavClientConfig;
use super::listing::{find_entry, parse_directory_listing};
use super::navigation::NavigationGuard;
use super::path::DavPath;

/// Header carrying the real WebDAV method when it travels as POST.
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Content type used by [`WebDavClient::write_file`].
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// WebDAV primitives over one configured endpoint.
///
/// Each call sends exactly one request. Nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct WebDavClient {
    client: Client,
    config: WebDavClientConfig,
}

impl WebDavClient {
    pub fn new(config: WebDavClientConfig) -> Result<Self, WebDavError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WebDavError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WebDavClientConfig {
        &self.config
    }

    /// Lists the children of a directory.
    pub async fn list_directory(&self, path: &str, depth: Depth) -> Result<WebDavListing, WebDavError> {
        let dir = DavPath::new(path).into_directory();
        let body = self.propfind(&dir, depth).await?;
        let entries = parse_directory_listing(&body, self.config.base(), &dir);

        debug!("Listed {} entries in {}", entries.len(), dir);
        Ok(WebDavListing {
            path: dir.into_string(),
            entries,
        })
    }

    /// Like [`list_directory`](Self::list_directory), but returns `Ok(None)` when
    /// a newer navigation started on `guard` while this one was in flight.
    pub async fn list_directory_latest(
        &self,
        guard: &NavigationGuard,
        path: &str,
        depth: Depth,
    ) -> Result<Option<WebDavListing>, WebDavError> {
        let generation = guard.begin();
        let result = self.list_directory(path, depth).await;

        if !guard.is_current(generation) {
            debug!("Discarding stale listing of {}", path);
            return Ok(None);
        }
        result.map(Some)
    }

    /// Properties of a single resource, `None` if the server did not describe it.
    pub async fn stat(&self, path: &str) -> Result<Option<WebDavEntry>, WebDavError> {
        let target = DavPath::new(path);
        let body = self.propfind(&target, Depth::Zero).await?;
        Ok(find_entry(&body, self.config.base(), &target))
    }

    pub async fn read_file(&self, path: &str) -> Result<String, WebDavError> {
        let url = self.config.url_for(DavPath::new(path).as_str());
        let response = self.send(Method::GET, &url, |req| req).await?;
        response.text().await.map_err(|e| WebDavError::network(&url, &e))
    }

    pub async fn write_file(&self, path: &str, content: impl Into<String>) -> Result<(), WebDavError> {
        self.write_file_with_type(path, content, DEFAULT_CONTENT_TYPE).await
    }

    pub async fn write_file_with_type(
        &self,
        path: &str,
        content: impl Into<String>,
        content_type: &str,
    ) -> Result<(), WebDavError> {
        let url = self.config.url_for(DavPath::new(path).as_str());
        let content = content.into();
        info!("Writing {} bytes to {}", content.len(), path);

        self.send(Method::PUT, &url, |req| {
            req.header(header::CONTENT_TYPE, content_type).body(content)
        })
        .await?;
        Ok(())
    }

    pub async fn delete_entry(&self, path: &str) -> Result<(), WebDavError> {
        let url = self.config.url_for(DavPath::new(path).as_str());
        info!("Deleting {}", path);
        self.send(Method::DELETE, &url, |req| req).await?;
        Ok(())
    }

    pub async fn create_directory(&self, path: &str) -> Result<(), WebDavError> {
        let dir = DavPath::new(path).into_directory();
        let url = self.config.url_for(dir.as_str());
        info!("Creating directory {}", dir);
        self.send(webdav_method(b"MKCOL")?, &url, |req| req).await?;
        Ok(())
    }

    pub async fn move_entry(&self, source: &str, destination: &str) -> Result<(), WebDavError> {
        self.relocate(webdav_method(b"MOVE")?, source, destination).await
    }

    pub async fn copy_entry(&self, source: &str, destination: &str) -> Result<(), WebDavError> {
        self.relocate(webdav_method(b"COPY")?, source, destination).await
    }

    async fn relocate(&self, method: Method, source: &str, destination: &str) -> Result<(), WebDavError> {
        let url = self.config.url_for(DavPath::new(source).as_str());
        let target = self.config.destination_for(DavPath::new(destination).as_str());
        info!("{} {} -> {}", method, source, destination);

        self.send(method, &url, |req| req.header("Destination", target)).await?;
        Ok(())
    }

    async fn propfind(&self, path: &DavPath, depth: Depth) -> Result<String, WebDavError> {
        let url = self.config.url_for(path.as_str());
        let response = self
            .send(webdav_method(b"PROPFIND")?, &url, |req| {
                req.header("Depth", depth.as_str())
                    .header(header::CONTENT_TYPE, "application/xml")
                    .body(PROPFIND_BODY)
            })
            .await?;

        response.text().await.map_err(|e| WebDavError::network(&url, &e))
    }

    /// Sends one request and turns any non-2xx status into [`WebDavError::Upstream`].
    async fn send<F>(&self, method: Method, url: &str, customize: F) -> Result<Response, WebDavError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        debug!("{} {}", method, url);

        let mut request = if self.config.method_override && needs_override(&method) {
            self.client
                .post(url)
                .header(METHOD_OVERRIDE_HEADER, method.as_str())
        } else {
            self.client.request(method.clone(), url)
        };

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = customize(request)
            .send()
            .await
            .map_err(|e| WebDavError::network(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} {} failed with status {}", method, url, status);
            return Err(WebDavError::from_status(status));
        }

        Ok(response)
    }
}

/// Methods that ordinary HTTP stacks may refuse to carry.
fn needs_override(method: &Method) -> bool {
    ![Method::GET, Method::PUT, Method::DELETE, Method::POST, Method::HEAD].contains(method)
}

fn webdav_method(name: &'static [u8]) -> Result<Method, WebDavError> {
    Method::from_bytes(name)
        .map_err(|e| WebDavError::configuration(format!("invalid WebDAV method: {}", e)))
}
