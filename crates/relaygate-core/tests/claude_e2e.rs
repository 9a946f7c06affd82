mod common;

use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// `(event, data)` pairs of a Messages API SSE body, pings excluded.
fn events(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut lines = block.lines();
            let event = lines.next()?.strip_prefix("event: ")?.to_string();
            let data = lines.next()?.strip_prefix("data: ")?;
            Some((event, serde_json::from_str(data).ok()?))
        })
        .filter(|(event, _)| event != "ping")
        .collect()
}

#[tokio::test]
async fn test_messages_non_streaming_with_thinking() {
    let gw = gateway(vec![credential("a")], fast_retry()).await;
    let doc = unary(json!([
        {"text": "Let me think.", "thought": true, "thoughtSignature": "sig-thought-0123456789"},
        {"text": "Answer."}
    ]));
    Mock::given(method("POST"))
        .and(path("/v1internal:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc))
        .mount(&gw.upstream)
        .await;

    let response = gw
        .server
        .post("/v1/messages")
        .json(&json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 1024,
            "system": "You are terse.",
            "thinking": {"type": "enabled", "budget_tokens": 2048},
            "messages": [{"role": "user", "content": [{"type": "text", "text": "2+2?"}]}]
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["type"], "message");
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["content"][0]["type"], "thinking");
    assert_eq!(body["content"][0]["thinking"], "Let me think.");
    assert_eq!(body["content"][1]["type"], "text");
    assert_eq!(body["content"][1]["text"], "Answer.");
    assert_eq!(body["stop_reason"], "end_turn");
    assert_eq!(body["usage"]["input_tokens"], 4);

    let sent = gw.upstream_bodies().await;
    let request = &sent[0]["request"];
    assert_eq!(request["systemInstruction"]["parts"][0]["text"], "You are terse.");
    assert_eq!(request["generationConfig"]["maxOutputTokens"], 1024);
    assert_eq!(request["generationConfig"]["thinkingConfig"]["thinkingBudget"], 2048);
}

#[tokio::test]
async fn test_messages_streaming_event_sequence() {
    let gw = gateway(vec![credential("a")], fast_retry()).await;
    let body = sse(&[
        text_frame("Hi"),
        parts_frame(
            json!([{"functionCall": {"id": "toolu_1", "name": "lookup", "args": {"q": "x"}}}]),
            Some("STOP"),
        ),
    ]);
    Mock::given(method("POST"))
        .and(path("/v1internal:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&gw.upstream)
        .await;

    let response = gw
        .server
        .post("/v1/messages")
        .json(&json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 256,
            "stream": true,
            "tools": [{"name": "lookup", "input_schema": {"type": "object", "properties": {"q": {"type": "string"}}}}],
            "messages": [{"role": "user", "content": "look it up"}]
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");

    let events = events(&response.text());
    let names: Vec<&str> = events.iter().map(|(e, _)| e.as_str()).collect();
    assert_eq!(names.first(), Some(&"message_start"));
    assert_eq!(names.last(), Some(&"message_stop"));

    let text_delta = events
        .iter()
        .find(|(e, d)| e == "content_block_delta" && d["delta"]["type"] == "text_delta")
        .unwrap();
    assert_eq!(text_delta.1["delta"]["text"], "Hi");

    let tool_start = events
        .iter()
        .find(|(e, d)| e == "content_block_start" && d["content_block"]["type"] == "tool_use")
        .unwrap();
    assert_eq!(tool_start.1["content_block"]["name"], "lookup");
    assert_eq!(tool_start.1["content_block"]["id"], "toolu_1");

    let (_, delta) = events.iter().find(|(e, _)| e == "message_delta").unwrap();
    assert_eq!(delta["delta"]["stop_reason"], "tool_use");
}

#[tokio::test]
async fn test_messages_tool_result_round_trip() {
    let gw = gateway(vec![credential("a")], fast_retry()).await;
    Mock::given(method("POST"))
        .and(path("/v1internal:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(unary(json!([{"text": "Done."}]))))
        .mount(&gw.upstream)
        .await;

    let response = gw
        .server
        .post("/v1/messages")
        .json(&json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 256,
            "messages": [
                {"role": "user", "content": "look it up"},
                {"role": "assistant", "content": [
                    {"type": "tool_use", "id": "toolu_9", "name": "lookup", "input": {"q": "x"}}
                ]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "toolu_9", "content": "found"}
                ]}
            ]
        }))
        .await;
    response.assert_status_ok();

    let sent = gw.upstream_bodies().await;
    let contents = sent[0]["request"]["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[1]["parts"][0]["functionCall"]["id"], "toolu_9");
    assert_eq!(contents[2]["parts"][0]["functionResponse"]["name"], "lookup");
    assert_eq!(contents[2]["parts"][0]["functionResponse"]["response"]["result"], "found");
}

#[tokio::test]
async fn test_messages_invalid_role_rejected() {
    let gw = gateway(vec![credential("a")], fast_retry()).await;

    let response = gw
        .server
        .post("/v1/messages")
        .json(&json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 16,
            "messages": [{"role": "narrator", "content": "hi"}]
        }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "invalid_request_error");
}
