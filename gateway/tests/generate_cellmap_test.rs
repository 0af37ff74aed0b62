use std::net::SocketAddr;

use gridmind_core::{LlmClient, LlmClientConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_gateway(upstream: &MockServer) -> SocketAddr {
    let cfg = LlmClientConfig {
        base_url: upstream.uri(),
        api_key: "test-key".to_string(),
        request_timeout_ms: 2_000,
        http_referer: None,
        app_title: "Gridmind".to_string(),
    };
    let llm = LlmClient::new(cfg).unwrap();
    let app = gridmind_gateway::router(llm);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn upstream_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "content": content } }]
    }))
}

#[tokio::test]
async fn returns_cell_map_on_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(upstream_reply("{\"c1r1\":\"Math\"}"))
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(&upstream).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-cellmap"))
        .json(&json!({ "prompt": "school subjects" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "c1r1": "Math" }));
}

#[tokio::test]
async fn fenced_model_output_is_normalized() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(upstream_reply("```json\n{\"c1r1\":\"A\",\"c2r1\":\"B\"}\n```"))
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(&upstream).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-cellmap"))
        .json(&json!({ "prompt": "two columns" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "c1r1": "A", "c2r1": "B" }));
}

#[tokio::test]
async fn missing_model_field_forwards_the_default() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(
            json!({ "model": gridmind_core::DEFAULT_MODEL }),
        ))
        .respond_with(upstream_reply("{\"c1r1\":\"ok\"}"))
        .expect(1)
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(&upstream).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-cellmap"))
        .json(&json!({ "prompt": "anything" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn upstream_failure_returns_500_with_detail() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(&upstream).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-cellmap"))
        .json(&json!({ "prompt": "anything" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to process AI request:"));
    assert!(detail.contains("503"));
}

#[tokio::test]
async fn unparseable_model_output_returns_500_with_detail() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(upstream_reply("Sorry, I cannot produce a table for that."))
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(&upstream).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/generate-cellmap"))
        .json(&json!({ "prompt": "anything" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert!(!detail.is_empty());
    assert!(detail.contains("not valid JSON"));
}

#[tokio::test]
async fn cors_allows_the_paired_front_end_origin() {
    let upstream = MockServer::start().await;
    let addr = spawn_gateway(&upstream).await;

    let resp = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{addr}/generate-cellmap"),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_rejects_unknown_origins() {
    let upstream = MockServer::start().await;
    let addr = spawn_gateway(&upstream).await;

    let resp = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{addr}/generate-cellmap"),
        )
        .header("Origin", "http://evil.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
