//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /api/v2/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use cascade_tuner::api::{create_app, AppState};
use cascade_tuner::TunerConfig;

fn app() -> Router {
    create_app(AppState::new(Arc::new(TunerConfig::default())))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let resp = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(resp).await
}

async fn post(uri: &str, content_type: &str, body: String) -> (StatusCode, Value) {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    read(resp).await
}

async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Square wave 520/480 around setpoint 500, as historian JSON rows.
fn square_wave_rows(len: usize) -> Vec<Value> {
    (0..len)
        .map(|i| {
            json!({
                "time": format!("2025-06-01 08:{:02}:{:02}", i / 6, (i % 6) * 10),
                "setpointPrimary": 500,
                "measurePrimary": if (i / 2) % 2 == 0 { 520.0 } else { 480.0 },
                "measureSecondary": 80.0,
                "controlValveSecondary": 50.0
            })
        })
        .collect()
}

fn gains_body() -> (Value, Value) {
    (
        json!({"Kp": 1.0, "Ki": 0.5, "Kd": 0.2}),
        json!({"Kp": 0.8, "Ki": 0.4, "Kd": 0.1}),
    )
}

// ============================================================================
// System / config
// ============================================================================

#[tokio::test]
async fn test_health_reports_version() {
    let (status, json) = get("/api/v2/system/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["meta"]["version"], "2");
}

#[tokio::test]
async fn test_get_config_returns_effective_values() {
    let (status, json) = get("/api/v2/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["detection"]["oscillation_window"], 10);
    assert_eq!(json["data"]["aggregation"]["no_issue_floor_percent"], 3.0);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v2/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_config_raw_toml() {
    let toml = "[detection]\nsettling_tolerance = 1.5\n[plant]\nnmae = \"x\"\n";
    let (status, json) = post("/api/v2/config/validate", "text/plain", toml.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["valid"], false);
    assert_eq!(json["data"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["warnings"][0]["suggestion"], "plant.name");
}

#[tokio::test]
async fn test_validate_config_json_wrapper() {
    let body = json!({"toml": "[aggregation]\nno_issue_floor_percent = 5.0\n"}).to_string();
    let (status, json) = post("/api/v2/config/validate", "application/json", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["valid"], true);
}

// ============================================================================
// Evaluate
// ============================================================================

#[tokio::test]
async fn test_evaluate_square_wave_reports_issue() {
    let (outer, inner) = gains_body();
    let body = json!({
        "samples": square_wave_rows(100),
        "outerGains": outer,
        "innerGains": inner
    })
    .to_string();

    let (status, json) = post("/api/v2/evaluate", "application/json", body).await;
    assert_eq!(status, StatusCode::OK);
    let report = &json["data"];
    // Default 3 % band puts every ±20 sample outside tolerance.
    assert_eq!(report["status"], "PID1 settling time");
    assert_eq!(report["issuePercentages"]["settling"], 100.0);
    assert_eq!(report["recommendation"]["issueLabel"], "High Settling Time");
    assert_eq!(report["suggestedParameters"]["outerGains"]["Kp"], 1.15);
    assert_eq!(report["timestamps"].as_array().unwrap().len(), 100);
    assert_eq!(
        report["series"]["simulatedPreview"].as_array().unwrap().len(),
        100
    );
}

#[tokio::test]
async fn test_evaluate_no_good_markers_become_null() {
    let mut rows = square_wave_rows(30);
    rows[4]["measurePrimary"] = json!("No Good Data");
    rows[7]["measurePrimary"] = Value::Null;
    let (outer, inner) = gains_body();
    let body = json!({"samples": rows, "outerGains": outer, "innerGains": inner}).to_string();

    let (status, json) = post("/api/v2/evaluate", "application/json", body).await;
    assert_eq!(status, StatusCode::OK);
    let measured = &json["data"]["series"]["measuredOutput"];
    assert!(measured[4].is_null());
    assert!(measured[7].is_null());
    assert_eq!(measured[0], 520.0);
}

#[tokio::test]
async fn test_evaluate_empty_samples_is_bad_request() {
    let (outer, inner) = gains_body();
    let body = json!({"samples": [], "outerGains": outer, "innerGains": inner}).to_string();
    let (status, json) = post("/api/v2/evaluate", "application/json", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INSUFFICIENT_DATA");
}

#[tokio::test]
async fn test_evaluate_negative_gain_is_bad_request() {
    let body = json!({
        "samples": square_wave_rows(10),
        "outerGains": {"Kp": 1.0, "Ki": -0.5, "Kd": 0.0},
        "innerGains": {"Kp": 1.0, "Ki": 0.5, "Kd": 0.0}
    })
    .to_string();
    let (status, json) = post("/api/v2/evaluate", "application/json", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_GAINS");
}

#[tokio::test]
async fn test_evaluate_malformed_json_uses_envelope() {
    let (status, json) =
        post("/api/v2/evaluate", "application/json", "{\"samples\": [".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert_eq!(json["meta"]["version"], "2");
}

// ============================================================================
// Recommend
// ============================================================================

#[tokio::test]
async fn test_recommend_by_label_text() {
    let (outer, inner) = gains_body();
    let body = json!({
        "issue": "Valve Fully Open But Outlet Temp Low",
        "outerGains": outer,
        "innerGains": inner
    })
    .to_string();

    let (status, json) = post("/api/v2/recommend", "application/json", body).await;
    assert_eq!(status, StatusCode::OK);
    let rec = &json["data"];
    assert_eq!(rec["controllerId"], "PID2");
    assert_eq!(rec["changed"], true);
    assert_eq!(rec["adjustedGains"]["Kp"], 0.96);
    assert_eq!(rec["adjustedGains"]["Ki"], 0.44);
}

#[tokio::test]
async fn test_recommend_without_rule_passes_gains_through() {
    let (outer, inner) = gains_body();
    let body = json!({"issue": "sluggish", "outerGains": outer, "innerGains": inner}).to_string();

    let (status, json) = post("/api/v2/recommend", "application/json", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["changed"], false);
    assert_eq!(json["data"]["adjustedGains"], json["data"]["currentGains"]);
}

#[tokio::test]
async fn test_recommend_unknown_label_is_bad_request() {
    let (outer, inner) = gains_body();
    let body = json!({"issue": "wobble", "outerGains": outer, "innerGains": inner}).to_string();
    let (status, json) = post("/api/v2/recommend", "application/json", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"].as_str().unwrap().contains("wobble"));
}
