use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use base64ct::{Base64, Encoding};
use tracing::{debug, error, info};

use crate::{
    errors::ProxyError,
    services::webdav::{ADMIN_USERNAME, METHOD_OVERRIDE_HEADER, MOUNT_PREFIX},
    AppState,
};

const DEPTH: HeaderName = HeaderName::from_static("depth");
const DESTINATION: HeaderName = HeaderName::from_static("destination");
const DEFAULT_CONTENT_TYPE: HeaderValue = HeaderValue::from_static("application/xml");

/// Mount point of the proxy in the dashboard API.
pub const PROXY_PREFIX: &str = "/api/webdav";

/// Proxy routes: the mount root, with and without a trailing slash, and
/// everything below it. Bodies are relayed whole, so axum's body limit is off.
pub fn router() -> Router<Arc<AppState>> {
    let proxied = || -> MethodRouter<Arc<AppState>> {
        get(proxy_webdav)
            .post(proxy_webdav)
            .put(proxy_webdav)
            .delete(proxy_webdav)
    };

    Router::new()
        .route(PROXY_PREFIX, proxied())
        .route(&format!("{}/", PROXY_PREFIX), proxied())
        .route(&format!("{}/{{*path}}", PROXY_PREFIX), proxied())
        .layer(DefaultBodyLimit::disable())
}

/// The only headers that reach the upstream server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub depth: Option<HeaderValue>,
    pub content_type: Option<HeaderValue>,
    pub destination: Option<HeaderValue>,
    pub authorization: HeaderValue,
}

impl ForwardedHeaders {
    pub fn from_inbound(headers: &HeaderMap, token: &str) -> Self {
        Self {
            depth: headers.get(DEPTH).cloned(),
            content_type: headers.get(header::CONTENT_TYPE).cloned(),
            destination: headers.get(DESTINATION).cloned(),
            authorization: basic_authorization(token),
        }
    }

    fn apply(self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(depth) = self.depth {
            request = request.header(DEPTH, depth);
        }
        if let Some(content_type) = self.content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(destination) = self.destination {
            request = request.header(DESTINATION, destination);
        }
        request.header(header::AUTHORIZATION, self.authorization)
    }
}

/// `Basic base64(admin:<token>)`, marked sensitive so it never shows up in debug output.
pub fn basic_authorization(token: &str) -> HeaderValue {
    let encoded = Base64::encode_string(format!("{}:{}", ADMIN_USERNAME, token).as_bytes());
    // base64 output is always a valid header value
    let mut value = HeaderValue::try_from(format!("Basic {}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    value.set_sensitive(true);
    value
}

/// Method the upstream should see: the override header wins over the transport method.
pub fn effective_method(method: &Method, headers: &HeaderMap) -> Result<Method, ProxyError> {
    match headers.get(METHOD_OVERRIDE_HEADER) {
        Some(value) => {
            let raw = value.to_str().unwrap_or_default().trim().to_ascii_uppercase();
            Method::from_bytes(raw.as_bytes()).map_err(|_| ProxyError::InvalidMethod { method: raw })
        }
        None => Ok(method.clone()),
    }
}

/// Upstream path for an inbound path below the proxy route.
///
/// Segments are re-joined under `/dav/`; PROPFIND and MKCOL get a trailing slash
/// because the upstream treats it as marking a collection.
pub fn upstream_path(method: &Method, inbound_path: &str) -> String {
    let joined = inbound_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return format!("{}/", MOUNT_PREFIX);
    }

    let mut path = format!("{}/{}", MOUNT_PREFIX, joined);
    if matches!(method.as_str(), "PROPFIND" | "MKCOL") && !path.ends_with('/') {
        path.push('/');
    }
    path
}

async fn proxy_webdav(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let diagnostics = state.config.diagnostics();
    let Some((base_url, token)) = state.config.upstream() else {
        error!("WebDAV proxy called without upstream configuration: {:?}", diagnostics);
        return Err(ProxyError::NotConfigured { diagnostics });
    };

    let webdav_method = effective_method(&method, &headers)?;
    let inbound_path = uri.path().strip_prefix(PROXY_PREFIX).unwrap_or(uri.path());
    let mut url = format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        upstream_path(&webdav_method, inbound_path)
    );
    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }

    info!("Proxying {} (via {}) to {}", webdav_method, method, url);

    let forwarded = ForwardedHeaders::from_inbound(&headers, token);
    let mut request = forwarded.apply(state.http_client.request(webdav_method.clone(), &url));
    if method == Method::POST || method == Method::PUT {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(|e| {
        error!("WebDAV proxy request to {} failed: {}", url, e);
        ProxyError::Network {
            url: url.clone(),
            message: e.to_string(),
            diagnostics,
        }
    })?;

    let status = upstream.status();
    debug!("Upstream answered {} {} with {}", webdav_method, url, status);

    // Never read a 204 body; some transports hang on it
    if status == StatusCode::NO_CONTENT {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let bytes = upstream.bytes().await.map_err(|e| ProxyError::Network {
        url: url.clone(),
        message: e.to_string(),
        diagnostics,
    })?;

    Ok((status, [(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
