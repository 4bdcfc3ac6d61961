#![allow(clippy::unwrap_used)]
// Integration tests for `HttpSession` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use resttc_api::{Error, HttpSession, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpSession) {
    let server = MockServer::start().await;
    let session = HttpSession::open(&TransportConfig::default()).unwrap();
    (server, session)
}

// ── Anti-forgery handshake ──────────────────────────────────────────

#[tokio::test]
async fn test_harvested_token_is_echoed_on_post() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).append_header("Set-Cookie", "XSRF-TOKEN=tok-123; Path=/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/svc/op"))
        .and(header("X-XSRF-TOKEN", "tok-123"))
        .and(header("Pragma", "no-cache"))
        .and(body_json(json!({ "body": {} })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    session
        .harvest_anti_forgery(&format!("{}/", server.uri()))
        .await
        .unwrap();
    assert_eq!(
        session.anti_forgery_header_names().collect::<Vec<_>>(),
        vec!["X-XSRF-TOKEN"]
    );

    let resp = session
        .post_json(&format!("{}/svc/op", server.uri()), &json!({ "body": {} }))
        .await
        .unwrap();
    assert_eq!(resp, json!({ "ok": true }));
}

#[tokio::test]
async fn test_priming_ignores_error_status() {
    let (server, mut session) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    session.harvest_anti_forgery(&server.uri()).await.unwrap();
    assert_eq!(session.anti_forgery_header_names().count(), 0);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server exploded"))
        .mount(&server)
        .await;

    let result = session
        .post_json(&format!("{}/svc/op", server.uri()), &json!({}))
        .await;

    match result {
        Err(Error::Status {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert!(message.contains("server exploded"));
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_a_deserialization_error() {
    let (server, session) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = session
        .post_json(&format!("{}/svc/op", server.uri()), &json!({}))
        .await;

    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("login")),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_bytes() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/fms/fmsdownload/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/fms/fmsdownload/img.png", server.uri())).unwrap();
    let bytes = session.get_bytes(&url).await.unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    let missing = Url::parse(&format!("{}/fms/fmsdownload/nope.png", server.uri())).unwrap();
    let err = session.get_bytes(&missing).await.unwrap_err();
    assert!(err.is_not_found());
}
