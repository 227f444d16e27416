use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use logoforge_services::provider::{GenerationRequest, LogoProvider, ProviderError, RemoteProvider};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::fixtures::seed::logo_params;

/// Serve `router` on a random local port and return its base URL.
async fn mock_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn request() -> GenerationRequest {
    GenerationRequest {
        task_id: "task123".to_string(),
        params: logo_params(),
    }
}

fn provider(base: &str) -> RemoteProvider {
    RemoteProvider::new(&format!("{}/generate", base), Some("k3y".into()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn forwards_parameters_and_returns_assets() {
    let router = Router::new().route(
        "/generate",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["authorization"], "Bearer k3y");
            assert_eq!(body["task_id"], "task123");
            assert_eq!(body["company_name"], "Northwind");
            assert_eq!(body["styles"], serde_json::json!(["modern", "minimal"]));
            assert_eq!(body["description"], "a compass rose");
            Json(serde_json::json!({
                "success": true,
                "logos": ["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"],
                "hd_keys": ["hd/1.png", "hd/2.png"],
            }))
        }),
    );
    let base = mock_server(router).await;

    let assets = provider(&base).generate(&request()).await.unwrap();

    assert_eq!(assets.images, vec!["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"]);
    assert_eq!(assets.hd_keys, vec!["hd/1.png", "hd/2.png"]);
}

#[tokio::test]
async fn mismatched_hd_keys_are_dropped() {
    let router = Router::new().route(
        "/generate",
        post(|| async {
            Json(serde_json::json!({
                "success": true,
                "logos": ["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"],
                "hd_keys": ["hd/1.png"],
            }))
        }),
    );
    let base = mock_server(router).await;

    let assets = provider(&base).generate(&request()).await.unwrap();

    assert_eq!(assets.images.len(), 2);
    assert!(assets.hd_keys.is_empty());
}

#[tokio::test]
async fn unsuccessful_reply_is_rejected_with_message() {
    let router = Router::new().route(
        "/generate",
        post(|| async { Json(serde_json::json!({ "success": false, "message": "content policy" })) }),
    );
    let base = mock_server(router).await;

    let err = provider(&base).generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected(ref m) if m == "content policy"));
}

#[tokio::test]
async fn http_error_is_rejected_with_status() {
    let router = Router::new().route(
        "/generate",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let base = mock_server(router).await;

    let err = provider(&base).generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected(ref m) if m.contains("503") && m.contains("busy")));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let router = Router::new().route("/generate", post(|| async { "<html>oops</html>" }));
    let base = mock_server(router).await;

    let err = provider(&base).generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn empty_logo_list_is_an_error() {
    let router = Router::new().route(
        "/generate",
        post(|| async { Json(serde_json::json!({ "success": true, "logos": [] })) }),
    );
    let base = mock_server(router).await;

    let err = provider(&base).generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let router = Router::new().route(
        "/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "success": true, "logos": ["https://cdn.test/1.jpg"] }))
        }),
    );
    let base = mock_server(router).await;
    let provider =
        RemoteProvider::new(&format!("{}/generate", base), None, Duration::from_millis(100)).unwrap();

    let err = provider.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout));
}

#[tokio::test]
async fn unreachable_provider_is_a_connection_error() {
    // Grab a free port, then close it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(&format!("http://{}", addr))
        .generate(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Connection(_)));
}
