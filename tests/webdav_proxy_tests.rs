use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use homeserver_dav::{config::Config, create_router, AppState};
use tower::util::ServiceExt;
use wiremock::{
    matchers::{any, body_string, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const TOKEN: &str = "secret";
const BASIC_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

fn test_app(base_url: Option<&str>, token: Option<&str>) -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        webdav_base_url: base_url.map(str::to_string),
        admin_token: token.map(str::to_string),
        webdav_timeout_seconds: Some(5),
    };
    create_router(Arc::new(AppState::new(config).unwrap()))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn multistatus() -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<D:multistatus xmlns:D="DAV:">
    <D:response>
        <D:href>/dav/alice/pub/</D:href>
        <D:propstat>
            <D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
            <D:status>HTTP/1.1 200 OK</D:status>
        </D:propstat>
    </D:response>
</D:multistatus>"#
        .to_string()
}

#[tokio::test]
async fn test_method_override_issues_propfind_with_trailing_slash() {
    let upstream = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/alice/pub/"))
        .and(header("depth", "1"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(207).set_body_raw(multistatus(), "application/xml"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webdav/alice/pub")
                .header("X-HTTP-Method-Override", "PROPFIND")
                .header("Depth", "1")
                .header("Content-Type", "application/xml")
                .body(Body::from("<propfind/>"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 207);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/xml"
    );
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("/dav/alice/pub/"));
}

#[tokio::test]
async fn test_root_path_targets_mount_root() {
    let upstream = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(multistatus(), "application/xml"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webdav")
                .header("X-HTTP-Method-Override", "PROPFIND")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 207);
}

#[tokio::test]
async fn test_root_path_with_trailing_slash_targets_mount_root() {
    let upstream = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/dav/"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(207).set_body_raw(multistatus(), "application/xml"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webdav/")
                .header("X-HTTP-Method-Override", "PROPFIND")
                .header("Depth", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 207);
}

#[tokio::test]
async fn test_large_put_body_is_forwarded_whole() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/dav/alice/big.txt"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&upstream)
        .await;

    let content = vec![b'x'; 3 * 1024 * 1024];
    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/webdav/alice/big.txt")
                .header("Content-Type", "text/plain")
                .body(Body::from(content.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests[0].body.len(), content.len());
}

#[tokio::test]
async fn test_no_content_is_relayed_without_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/dav/alice/pub/old.txt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/webdav/alice/pub/old.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 204);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_put_forwards_body_and_content_type() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/dav/alice/pub/notes.txt"))
        .and(header("content-type", "text/plain"))
        .and(body_string("hello homeserver"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/webdav/alice/pub/notes.txt")
                .header("Content-Type", "text/plain")
                .body(Body::from("hello homeserver"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_only_allow_listed_headers_reach_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/webdav/alice/pub/a.txt")
            .header("X-HTTP-Method-Override", "MOVE")
            .header("Destination", "http://homeserver/dav/alice/pub/b.txt")
            .header("Cookie", "session=abc")
            .header("Authorization", "Bearer browser-token")
            .header("X-Custom", "injected")
            .body(Body::from("ignored by MOVE"))
            .unwrap(),
    )
    .await
    .unwrap();

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method.as_str(), "MOVE");
    assert_eq!(request.url.path(), "/dav/alice/pub/a.txt");
    assert_eq!(
        request.headers.get("destination").unwrap().to_str().unwrap(),
        "http://homeserver/dav/alice/pub/b.txt"
    );
    assert_eq!(
        request.headers.get("authorization").unwrap().to_str().unwrap(),
        BASIC_AUTH
    );
    assert!(request.headers.get("cookie").is_none());
    assert!(request.headers.get("x-custom").is_none());
    assert!(request.headers.get("x-http-method-override").is_none());
}

#[tokio::test]
async fn test_get_never_carries_body_and_keeps_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dav/alice/pub/notes.txt"))
        .and(query_param("version", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("contents", "text/plain"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/webdav/alice/pub/notes.txt?version=2")
                .body(Body::from("stray body"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/plain"
    );
    assert_eq!(body_bytes(response).await, b"contents");

    let requests = upstream.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_upstream_errors_relayed_with_default_content_type() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/webdav/alice/missing.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/xml"
    );
}

#[tokio::test]
async fn test_missing_token_fails_before_any_network_call() {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = test_app(Some(&upstream.uri()), None);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webdav/alice/pub")
                .header("X-HTTP-Method-Override", "PROPFIND")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["code"], "PROXY_NOT_CONFIGURED");
    assert_eq!(json["config"]["hasBaseUrl"], true);
    assert_eq!(json["config"]["hasToken"], false);

    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_base_url_is_configuration_error() {
    let app = test_app(None, Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/webdav/alice/pub/notes.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("\"hasBaseUrl\":false"));
    assert!(!body.contains(TOKEN));
}

#[tokio::test]
async fn test_network_failure_reports_url_and_config() {
    // Nothing listens on port 1
    let app = test_app(Some("http://127.0.0.1:1"), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/webdav/alice/pub/notes.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["code"], "PROXY_NETWORK_ERROR");
    assert_eq!(json["url"], "http://127.0.0.1:1/dav/alice/pub/notes.txt");
    assert_eq!(json["config"]["hasToken"], true);
    assert!(!json.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_invalid_override_is_rejected() {
    let app = test_app(Some("http://127.0.0.1:1"), Some(TOKEN));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webdav/alice")
                .header("X-HTTP-Method-Override", "BAD METHOD")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
