use chrono::Duration;
use logoforge_db::models::{TaskResult, TaskStatus};
use logoforge_services::Clock;
use serde_json::Value;

use crate::fixtures::provider::{Behavior, FakeProvider};
use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn generate_requires_token() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/logo/generate"))
        .json(&crate::fixtures::seed::logo_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .auth_post("/api/logo/generate", "not-a-jwt")
        .json(&crate::fixtures::seed::logo_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn generate_rejects_invalid_parameters() {
    let app = TestApp::spawn().await;
    let token = app.token_for("alice");

    let mut body = crate::fixtures::seed::logo_request();
    body["styles"] = serde_json::json!([]);
    let resp = app
        .auth_post("/api/logo/generate", &token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "validation");

    let mut body = crate::fixtures::seed::logo_request();
    body["company_name"] = serde_json::json!("x".repeat(51));
    let resp = app
        .auth_post("/api/logo/generate", &token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn generate_returns_pending_task_without_waiting() {
    let app = TestApp::spawn_with_provider(FakeProvider::new(Behavior::Hang)).await;
    let token = app.token_for("alice");

    let resp = app
        .auth_post("/api/logo/generate", &token)
        .json(&crate::fixtures::seed::logo_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["task_id"].as_str().unwrap().len(), 32);
    assert!(json["message"].is_string());

    let other = app.submit_logo(&token).await;
    assert_ne!(json["task_id"].as_str().unwrap(), other);
}

#[tokio::test]
async fn successful_generation_is_served_by_result() {
    let app = TestApp::spawn().await;
    let token = app.token_for("alice");
    let task_id = app.submit_logo(&token).await;

    let status = app.wait_for_status(&token, &task_id, "success").await;
    assert_eq!(status["progress"], 100);

    let resp = app
        .auth_get(&format!("/api/logo/result?task_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["task_id"], task_id.as_str());
    assert_eq!(json["status"], "success");
    assert_eq!(
        json["logos"],
        serde_json::json!([
            format!("https://cdn.test/normal/logo_{task_id}_0.jpg"),
            format!("https://cdn.test/normal/logo_{task_id}_1.jpg"),
        ])
    );
    assert_eq!(json["company_name"], "Northwind");
    assert_eq!(json["industry"], "logistics");
    assert_eq!(json["styles"], serde_json::json!(["modern", "minimal"]));
    assert_eq!(json["colors"], serde_json::json!(["navy", "#ff8800"]));
    assert_eq!(json["description"], "a compass rose");
    assert!(json["create_time"].is_string());
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn exhausted_retries_persist_failure() {
    let app = TestApp::spawn_with_provider(FakeProvider::new(Behavior::Fail("model overloaded".into()))).await;
    let token = app.token_for("alice");
    let task_id = app.submit_logo(&token).await;

    let status = app.wait_for_status(&token, &task_id, "fail").await;
    let message = status["message"].as_str().unwrap();
    assert!(message.contains("3 attempts"));
    assert!(message.contains("model overloaded"));
    assert_eq!(app.provider.calls(), 3);

    let resp = app
        .auth_get(&format!("/api/logo/result?task_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "fail");
    assert_eq!(json["logos"], serde_json::json!([]));
    assert!(!json["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn foreign_and_unknown_tasks_look_the_same() {
    let app = TestApp::spawn().await;
    let alice = app.token_for("alice");
    let bob = app.token_for("bob");
    let task_id = app.submit_logo(&alice).await;
    app.wait_for_status(&alice, &task_id, "success").await;

    for path in [
        format!("/api/logo/status?task_id={}", task_id),
        format!("/api/logo/result?task_id={}", task_id),
        format!("/api/image/hd-url?logo_id={}", task_id),
        "/api/logo/result?task_id=doesnotexist".to_string(),
    ] {
        let resp = app.auth_get(&path, &bob).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 404, "{}", path);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "not_found");
    }
}

#[tokio::test]
async fn stale_task_times_out_on_read() {
    let app = TestApp::spawn_with_provider(FakeProvider::new(Behavior::Hang)).await;
    let token = app.token_for("alice");
    let task_id = app.submit_logo(&token).await;
    app.wait_for_status(&token, &task_id, "processing").await;

    app.clock.advance(Duration::minutes(6));

    let path = format!("/api/logo/result?task_id={}", task_id);
    let resp = app.auth_get(&path, &token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 504);

    let resp = app.auth_get(&path, &token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "fail");
    assert_eq!(json["message"], "generation timed out");
}

#[tokio::test]
async fn old_task_is_gone() {
    let app = TestApp::spawn().await;
    let token = app.token_for("alice");
    let created = app.clock.now() - Duration::days(8);
    let task_id = app.plant_task(
        "alice",
        TaskStatus::Success,
        Some(TaskResult::Assets {
            images: vec!["https://cdn.test/a.jpg".into()],
            hd_keys: vec![],
        }),
        created,
    );

    let resp = app
        .auth_get(&format!("/api/logo/result?task_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 410);
}

#[tokio::test]
async fn malformed_success_is_a_server_error() {
    let app = TestApp::spawn().await;
    let token = app.token_for("alice");
    let task_id = app.plant_task(
        "alice",
        TaskStatus::Success,
        Some(TaskResult::Assets {
            images: vec![],
            hd_keys: vec![],
        }),
        app.clock.now(),
    );

    let resp = app
        .auth_get(&format!("/api/logo/result?task_id={}", task_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 500);
}
