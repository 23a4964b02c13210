//! HTTP-backed tools against mocked endpoints.

use serde_json::{json, Value};
use tiny_research::tools::{CrawlTool, Tool, WebSearchTool};
use tiny_research::types::AppError;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_prefixes_reader_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"example\.org/article$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Article\n\nBody text"))
        .expect(1)
        .mount(&server)
        .await;

    let tool = CrawlTool::new(format!("{}/", server.uri()));
    let text = tool
        .execute(json!({"url": "https://example.org/article"}))
        .await
        .unwrap();
    assert_eq!(text, "# Article\n\nBody text");
}

#[tokio::test]
async fn test_crawl_http_failure_names_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let tool = CrawlTool::new(format!("{}/", server.uri()));
    let err = tool
        .execute(json!({"url": "https://example.org/down"}))
        .await
        .unwrap_err();

    match err {
        AppError::Tool { name, message } => {
            assert_eq!(name, "crawl");
            assert!(message.contains("https://example.org/down"));
            assert!(message.contains("502"));
        }
        other => panic!("expected tool error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tavily_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "rust async runtimes",
            "max_results": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust async runtimes",
            "results": [
                {"title": "Tokio", "url": "https://tokio.rs", "content": "An asynchronous runtime", "score": 0.9},
                {"title": "smol", "url": "https://github.com/smol-rs/smol", "content": "A small runtime"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tool = WebSearchTool::tavily(
        "tvly-test".to_string(),
        format!("{}/search", server.uri()),
        5,
    );
    assert_eq!(tool.backend_name(), "tavily");

    let output = tool
        .execute(json!({"query": "rust async runtimes", "max_results": 2}))
        .await
        .unwrap();
    let hits: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 2);
    assert_eq!(hits[0]["title"], "Tokio");
    assert_eq!(hits[0]["url"], "https://tokio.rs");
    assert_eq!(hits[1]["content"], "A small runtime");
}

#[tokio::test]
async fn test_tavily_error_is_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let tool = WebSearchTool::tavily("bad".to_string(), server.uri(), 5);
    let err = tool.execute(json!({"query": "x"})).await.unwrap_err();
    match err {
        AppError::Tool { name, message } => {
            assert_eq!(name, "web_search");
            assert!(message.contains("invalid api key"));
        }
        other => panic!("expected tool error, got {:?}", other),
    }
}
