mod common;

use backoffice_service::services::init_metrics;
use common::{id_of, on_cash, Fixture, TestApp};
use serde_json::json;
use std::sync::Once;

// Initialize metrics once for all tests
static INIT_METRICS: Once = Once::new();

fn ensure_metrics_initialized() {
    INIT_METRICS.call_once(|| {
        init_metrics();
    });
}

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "backoffice-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "req-42")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    ensure_metrics_initialized();
    let app = TestApp::spawn().await;
    let f = Fixture::create(&app).await;
    app.purchase(&f.company, &f.item, "1", "0", on_cash()).await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("backoffice_postings_total"));
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn account_queries_are_timed_on_postgres() {
    // Only the Postgres store records query timings
    if std::env::var("TEST_DATABASE_URL").is_err() {
        return;
    }
    ensure_metrics_initialized();
    let app = TestApp::spawn().await;

    let body = app.post_ok("/coa", json!({ "acName": "Rent" }), 201).await;
    let rent = id_of(&body["expenseAccount"]);
    let response = app
        .put(&format!("/coa/{}", rent), json!({ "acName": "Shop rent" }))
        .await;
    assert!(response.status().is_success());
    app.get_json("/coa").await;

    let body = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");
    for operation in ["create_account", "rename_account", "list_accounts"] {
        assert!(
            body.contains(&format!("operation=\"{}\"", operation)),
            "no timing for {}",
            operation
        );
    }
}
