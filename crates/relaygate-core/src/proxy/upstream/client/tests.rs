use super::*;
use relaygate_types::protocol::gemini::GenerateRequest;
use relaygate_types::{FinishReason, NormalizedEvent};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::proxy::scheduler::tests::make_credential;
use crate::proxy::upstream::stream::tests::test_context;

#[test]
fn test_build_url() {
    let base_url = "https://cloudcode-pa.googleapis.com/v1internal";

    let url1 = build_url(base_url, "generateContent", None);
    assert_eq!(url1, "https://cloudcode-pa.googleapis.com/v1internal:generateContent");

    let url2 = build_url(base_url, "streamGenerateContent", Some("alt=sse"));
    assert_eq!(
        url2,
        "https://cloudcode-pa.googleapis.com/v1internal:streamGenerateContent?alt=sse"
    );
}

#[test]
fn test_build_headers() {
    let headers = build_headers("tok-a", "relaygate/1.0").unwrap();
    assert_eq!(headers["authorization"], "Bearer tok-a");
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["user-agent"], "relaygate/1.0");

    assert!(build_headers("bad\ntoken", "ua").is_err());
}

fn client_for(server: &MockServer) -> UpstreamClient {
    let config = UpstreamConfig {
        base_url: format!("{}/v1internal", server.uri()),
        user_agent: "relaygate-test".to_string(),
        ..Default::default()
    };
    UpstreamClient::new(reqwest::Client::new(), &config)
}

fn hello_request() -> GenerateRequest {
    GenerateRequest {
        contents: vec![json!({"role": "user", "parts": [{"text": "hi"}]})],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stream_generate_success() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"response\":{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}}\n\n",
        "data: {\"response\":{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}],",
        "\"usageMetadata\":{\"promptTokenCount\":3,\"totalTokenCount\":5}}}\n\n"
    );
    Mock::given(method("POST"))
        .and(path("/v1internal:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("authorization", "Bearer tok-a"))
        .and(body_partial_json(json!({
            "project": "project-a",
            "model": "gemini-2.5-flash",
            "request": {"contents": [{"role": "user", "parts": [{"text": "hi"}]}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let cred = make_credential("a");
    let stream = client_for(&server)
        .stream_generate(&cred, "gemini-2.5-flash", "openai", hello_request(), test_context())
        .await
        .unwrap();
    let events: Vec<NormalizedEvent> = stream.map(|e| e.unwrap()).collect().await;

    assert_eq!(events[0], NormalizedEvent::Text { text: "Hel".to_string() });
    assert_eq!(events[1], NormalizedEvent::Text { text: "lo".to_string() });
    match &events[2] {
        NormalizedEvent::UsageMetadata(usage) => assert_eq!(usage.completion_tokens, 2),
        other => panic!("expected usage, got {:?}", other),
    }
    assert_eq!(events[3], NormalizedEvent::Finish { reason: FinishReason::Stop });
}

#[tokio::test]
async fn test_session_id_comes_from_credential() {
    let server = MockServer::start().await;
    let cred = make_credential("a");
    Mock::given(method("POST"))
        .and(path("/v1internal:generateContent"))
        .and(body_partial_json(json!({"request": {"sessionId": cred.session_id}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"candidates": [{"content": {"parts": [{"text": "ok"}]}, "finishReason": "STOP"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client_for(&server).generate(&cred, "m", "gemini", hello_request()).await.unwrap();
    assert_eq!(doc["candidates"][0]["content"]["parts"][0]["text"], "ok");
}

#[tokio::test]
async fn test_rate_limit_failure_carries_retry_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "2.5s"}]
            }
        })))
        .mount(&server)
        .await;

    let cred = make_credential("a");
    let Err(failure) = client_for(&server)
        .stream_generate(&cred, "m", "openai", hello_request(), test_context())
        .await
    else {
        panic!("expected failure");
    };

    assert_eq!(failure.status, 429);
    assert!(failure.is_rate_limited());
    assert_eq!(failure.message, "Resource has been exhausted");
    assert_eq!(failure.retry_after, Some(Duration::from_millis(2500)));
}

#[tokio::test]
async fn test_retry_after_header_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("retry-after", "7")
                .set_body_string("backend unavailable"),
        )
        .mount(&server)
        .await;

    let failure = client_for(&server)
        .generate(&make_credential("a"), "m", "openai", hello_request())
        .await
        .unwrap_err();
    assert_eq!(failure.status, 503);
    assert_eq!(failure.retry_after, Some(Duration::from_secs(7)));
    assert_eq!(failure.message, "backend unavailable");
}

#[tokio::test]
async fn test_embedded_auth_failure_in_first_frame() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"error\":{\"code\":401,\"message\":\"Request had invalid authentication credentials.\",\"status\":\"UNAUTHENTICATED\"}}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .stream_generate(&make_credential("a"), "m", "openai", hello_request(), test_context())
        .await;
    let Err(failure) = result else { panic!("expected auth failure") };

    assert_eq!(failure.status, 401);
    assert!(failure.is_auth());
}

#[tokio::test]
async fn test_embedded_auth_failure_in_unary_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 403, "status": "PERMISSION_DENIED", "message": "denied"}
        })))
        .mount(&server)
        .await;

    let failure = client_for(&server)
        .generate_events(&make_credential("a"), "m", "openai", hello_request(), test_context())
        .await
        .unwrap_err();
    assert!(failure.is_auth());
    assert_eq!(failure.status, 403);
}

#[tokio::test]
async fn test_empty_stream_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(": ping\n\n", "text/event-stream"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .stream_generate(&make_credential("a"), "m", "openai", hello_request(), test_context())
        .await;
    let Err(failure) = result else { panic!("expected failure") };
    assert_eq!(failure.status, 502);
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let config = UpstreamConfig {
        base_url: "http://127.0.0.1:1/v1internal".to_string(),
        ..Default::default()
    };
    let client = UpstreamClient::new(reqwest::Client::new(), &config);

    let failure =
        client.generate(&make_credential("a"), "m", "openai", hello_request()).await.unwrap_err();
    assert!(failure.is_transport());
    assert_eq!(failure.status, 0);
}
