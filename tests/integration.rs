//! Integration tests for the boiler dashboard HTTP server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use boilerwatch::form::{PredictionInput, SAFE_MESSAGE, UNSAFE_MESSAGE};
use boilerwatch::model::Model;
use boilerwatch::server::{router, ServerConfig, ServerState, MAX_BODY_BYTES};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

// ---------------------------------------------------------------------------
// Helper: spin up a test server on an ephemeral port
// ---------------------------------------------------------------------------

/// Copy the fixtures into a scratch directory the test may rewrite.
fn workspace(model_fixture: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("boiler_fault_dataset.csv");
    let model = dir.path().join("boiler_fault_model.json");
    std::fs::copy(Path::new(FIXTURES).join("boiler_fault_dataset.csv"), &dataset).unwrap();
    std::fs::copy(Path::new(FIXTURES).join(model_fixture), &model).unwrap();
    (dir, dataset, model)
}

async fn spawn_test_server() -> (SocketAddr, Arc<ServerState>, TempDir) {
    spawn_test_server_with("boiler_fault_model.json", 0).await
}

async fn spawn_test_server_with(
    model_fixture: &str,
    rate_limit_rpm: u32,
) -> (SocketAddr, Arc<ServerState>, TempDir) {
    let (dir, dataset_path, model_path) = workspace(model_fixture);
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        dataset_path,
        model_path,
        rate_limit_rpm,
        cache_capacity: 4,
    };
    let state = Arc::new(ServerState::new(config));
    let app = router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, state, dir)
}

async fn get_json(addr: SocketAddr, path: &str) -> (u16, serde_json::Value) {
    let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn post_predict(addr: SocketAddr, body: &str) -> (u16, serde_json::Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/v1/predict"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ---------------------------------------------------------------------------
// Health / stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_kind"], "random_forest");
    assert!(body["fingerprint"].as_str().unwrap().starts_with("sha256:"));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_health_reports_broken_inputs() {
    let (addr, state, _dir) = spawn_test_server().await;
    std::fs::write(&state.config.model_path, "not json").unwrap();

    let (status, body) = get_json(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("model artifact"));
}

#[tokio::test]
async fn test_repeated_requests_hit_cache() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (_, first) = get_json(addr, "/api/v1/summary").await;
    let (_, second) = get_json(addr, "/api/v1/summary").await;
    assert_eq!(first, second);

    let (status, stats) = get_json(addr, "/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["cache"]["misses"], 1);
    assert_eq!(stats["cache"]["hits"], 1);
    assert_eq!(stats["cache"]["entries"], 1);
    assert_eq!(stats["endpoints"]["summary"], 2);
}

#[tokio::test]
async fn test_changed_model_rebuilds_snapshot() {
    let (addr, state, _dir) = spawn_test_server().await;

    let (_, before) = get_json(addr, "/health").await;
    std::fs::copy(
        Path::new(FIXTURES).join("boiler_fault_linear.json"),
        &state.config.model_path,
    )
    .unwrap();
    let (_, after) = get_json(addr, "/health").await;

    assert_eq!(after["model_kind"], "logistic_regression");
    assert_ne!(before["fingerprint"], after["fingerprint"]);
}

// ---------------------------------------------------------------------------
// Dataset overview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_summary_metrics() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/api/v1/summary").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["title"], "🚢 Boiler Fault Detection Dashboard");
    assert_eq!(body["rows"], 40);

    let values: Vec<&str> = body["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, ["258.49 °C", "55.50 bar", "70.0%"]);
}

#[tokio::test]
async fn test_rows_snap_to_slider_steps() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (_, default) = get_json(addr, "/api/v1/rows").await;
    assert_eq!(default["count"], 5);
    assert_eq!(default["total"], 40);
    assert_eq!(default["rows"].as_array().unwrap().len(), 5);
    assert_eq!(default["columns"].as_array().unwrap().len(), 7);

    let (_, twelve) = get_json(addr, "/api/v1/rows?count=12").await;
    assert_eq!(twelve["count"], 10);

    let (_, all) = get_json(addr, "/api/v1/rows?count=1000").await;
    assert_eq!(all["count"], 40);

    let (_, first) = get_json(addr, "/api/v1/rows?count=5").await;
    let statuses: Vec<&str> = first["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(&statuses[..4], ["Safe", "Safe", "Safe", "Unsafe"]);
}

#[tokio::test]
async fn test_rows_bad_count_is_json_error() {
    let (addr, _state, _dir) = spawn_test_server().await;

    for query in ["count=abc", "count=-5"] {
        let resp = reqwest::get(format!("http://{addr}/api/v1/rows?{query}"))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        assert_eq!(
            resp.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query"));
    }
}

#[tokio::test]
async fn test_reordered_sensor_columns_are_rejected() {
    let (addr, state, _dir) = spawn_test_server().await;
    let csv = std::fs::read_to_string(&state.config.dataset_path).unwrap();
    let swapped: String = csv
        .lines()
        .map(|line| {
            let mut fields: Vec<&str> = line.split(',').collect();
            fields.swap(0, 1);
            format!("{}\n", fields.join(","))
        })
        .collect();
    std::fs::write(&state.config.dataset_path, swapped).unwrap();

    let (status, body) = get_json(addr, "/api/v1/importance").await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("schema"));
}

#[tokio::test]
async fn test_dataset_without_safe_rows_is_server_error() {
    let (addr, state, _dir) = spawn_test_server().await;
    let csv = std::fs::read_to_string(&state.config.dataset_path)
        .unwrap()
        .replace(",Safe", ",Unsafe");
    std::fs::write(&state.config.dataset_path, csv).unwrap();

    let (status, body) = get_json(addr, "/api/v1/summary").await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);

    let (_, stats) = get_json(addr, "/stats").await;
    assert_eq!(stats["requests"]["errors"], 1);
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_charts_gallery() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/api/v1/charts").await;
    assert_eq!(status, 200);
    let charts = body["charts"].as_array().unwrap();
    assert_eq!(charts.len(), 14);
    for chart in charts {
        assert!(chart["svg"].as_str().unwrap().contains("<svg"));
    }

    let ids: Vec<&str> = charts.iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids[0], "status_count");
    assert_eq!(ids[1], "correlation");
    assert_eq!(charts[0]["type"], "count");
    assert_eq!(charts[1]["type"], "heatmap");
}

#[tokio::test]
async fn test_chart_svg_endpoint() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let resp = reqwest::get(format!("http://{addr}/api/v1/charts/correlation"))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "image/svg+xml"
    );
    let svg = resp.text().await.unwrap();
    assert!(svg.contains("1.00"));

    let (status, body) = get_json(addr, "/api/v1/charts/no_such_chart").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_form_fields() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/api/v1/form").await;
    assert_eq!(status, 200);
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0]["key"], "flue_gas_temp");
    assert_eq!(fields[0]["min"], 150.0);
    assert_eq!(fields[0]["max"], 400.0);
    assert_eq!(fields[0]["default"], 250.0);
}

#[tokio::test]
async fn test_predict_safe_matches_model() {
    let (addr, state, _dir) = spawn_test_server().await;
    let example = [250.0, 55.0, 2.5, 60.0, 5.0, 3.8];
    let expected = Model::load(&state.config.model_path)
        .unwrap()
        .predict(&example)
        .unwrap();

    let body = serde_json::to_string(&PredictionInput::from_vector(example)).unwrap();
    let (status, resp) = post_predict(addr, &body).await;
    assert_eq!(status, 200);
    assert_eq!(resp["success"], true);
    assert_eq!(resp["label"], expected.as_str());
    assert_eq!(resp["label"], "Safe");
    assert_eq!(resp["safe"], true);
    assert_eq!(resp["message"], SAFE_MESSAGE);
}

#[tokio::test]
async fn test_predict_unsafe() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, resp) = post_predict(addr, r#"{"flue_gas_temp": 350.0}"#).await;
    assert_eq!(status, 200);
    assert_eq!(resp["label"], "Unsafe");
    assert_eq!(resp["safe"], false);
    assert_eq!(resp["message"], UNSAFE_MESSAGE);

    let (_, stats) = get_json(addr, "/stats").await;
    assert_eq!(stats["predictions"]["unsafe"], 1);
    assert_eq!(stats["predictions"]["safe"], 0);
}

#[tokio::test]
async fn test_predict_empty_body_uses_defaults() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, resp) = post_predict(addr, "").await;
    assert_eq!(status, 200);
    assert_eq!(
        resp["input"],
        serde_json::json!([250.0, 55.0, 2.5, 60.0, 5.0, 3.8])
    );
    assert_eq!(resp["label"], "Safe");
}

#[tokio::test]
async fn test_predict_clamps_out_of_range_input() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, resp) = post_predict(addr, r#"{"flue_gas_temp": 9000.0}"#).await;
    assert_eq!(status, 200);
    assert_eq!(resp["input"][0], 400.0);
}

#[tokio::test]
async fn test_predict_invalid_json() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, resp) = post_predict(addr, "{not json").await;
    assert_eq!(status, 400);
    assert_eq!(resp["success"], false);
    assert!(resp["error"].as_str().unwrap().starts_with("Invalid JSON"));

    let (status, _) = post_predict(addr, r#"{"drum_level": "high"}"#).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_predict_oversized_body_is_json_error() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let padding = " ".repeat(MAX_BODY_BYTES + 1);
    let (status, resp) = post_predict(addr, &format!("{{}}{padding}")).await;
    assert_eq!(status, 413);
    assert_eq!(resp["success"], false);
    assert!(!resp["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_predict_rate_limited() {
    let (addr, _state, _dir) = spawn_test_server_with("boiler_fault_model.json", 1).await;

    let (first, _) = post_predict(addr, "{}").await;
    assert_eq!(first, 200);
    let (second, resp) = post_predict(addr, "{}").await;
    assert_eq!(second, 429);
    assert!(resp["error"].as_str().unwrap().contains("Rate limit"));

    // Read-only endpoints are not limited.
    let (status, _) = get_json(addr, "/api/v1/summary").await;
    assert_eq!(status, 200);

    let (_, stats) = get_json(addr, "/stats").await;
    assert_eq!(stats["requests"]["rate_limited"], 1);
}

// ---------------------------------------------------------------------------
// Importance / insights
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_importance_for_forest() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/api/v1/importance").await;
    assert_eq!(status, 200);
    assert_eq!(body["available"], true);
    let table = body["table"].as_array().unwrap();
    assert_eq!(table.len(), 6);
    let scores: Vec<f64> = table
        .iter()
        .map(|r| r["importance"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(body["chart"]["svg"].as_str().unwrap().contains("<svg"));

    let resp = reqwest::get(format!("http://{addr}/api/v1/charts/importance"))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn test_importance_unavailable_for_linear_model() {
    let (addr, _state, _dir) = spawn_test_server_with("boiler_fault_linear.json", 0).await;

    let (status, body) = get_json(addr, "/api/v1/importance").await;
    assert_eq!(status, 200);
    assert_eq!(body["available"], false);
    assert_eq!(
        body["warning"],
        boilerwatch::importance::IMPORTANCE_WARNING
    );
    assert!(body.get("table").is_none());

    let (status, _) = get_json(addr, "/api/v1/charts/importance").await;
    assert_eq!(status, 404);

    // The linear model still predicts.
    let (status, resp) = post_predict(addr, "{}").await;
    assert_eq!(status, 200);
    assert_eq!(resp["label"], "Safe");
}

#[tokio::test]
async fn test_insights_and_index() {
    let (addr, _state, _dir) = spawn_test_server().await;

    let (status, body) = get_json(addr, "/api/v1/insights").await;
    assert_eq!(status, 200);
    assert_eq!(body["header"], "📝 Insights & Interpretation");
    assert!(!body["markdown"].as_str().unwrap().is_empty());

    let page = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Boiler Fault Detection Dashboard"));
}
