//! Integration test: Server API endpoints

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use ml_builder::config::AppConfig;
use ml_builder::server::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----mlbuilderboundary";

fn test_app() -> (TempDir, axum::Router) {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir: dir.path().join("uploads"),
        models_dir: dir.path().join("models"),
        max_upload_size: 10 * 1024 * 1024,
    };
    std::fs::create_dir_all(&config.upload_dir).unwrap();
    std::fs::create_dir_all(&config.models_dir).unwrap();
    let state = Arc::new(AppState::new(config));
    (dir, create_router(state))
}

fn classification_csv() -> String {
    let mut csv = String::from("length,width,kind\n");
    for i in 0..40 {
        let kind = if i % 2 == 0 { "cat" } else { "dog" };
        csv.push_str(&format!("{},{},{}\n", i, (i * 3) % 17, kind));
    }
    csv
}

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn run_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/pipeline/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_root_endpoint() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["message"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/nothing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pipeline_missing_dataset_is_a_failed_result() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(run_request(json!({
            "datasetName": "absent.csv",
            "steps": [{ "id": "1", "type": "drop_nulls" }]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Dataset not found"));
    assert_eq!(body["metrics"], json!({}));
    assert_eq!(body["model_path"], Value::Null);
}

#[tokio::test]
async fn test_pipeline_rejects_malformed_request() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(run_request(json!({ "steps": [] })))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_download_missing_model() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download/model_nothing.pkl")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Model file not found"));
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(multipart_upload("notes.txt", "a,b\n1,2\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_returns_profile() {
    let (dir, app) = test_app();
    let response = app
        .oneshot(multipart_upload("pets.csv", &classification_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], json!("pets.csv"));
    assert_eq!(body["rows"], json!(40));
    assert_eq!(body["columns"], json!(3));
    assert_eq!(body["column_names"], json!(["length", "width", "kind"]));
    assert_eq!(body["preview"].as_array().unwrap().len(), 5);
    assert!(body["correlations"].is_object());
    assert!(dir.path().join("uploads").join("pets.csv").is_file());
}

#[tokio::test]
async fn test_upload_run_download_flow() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("pets.csv", &classification_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(run_request(json!({
            "datasetName": "pets.csv",
            "steps": [
                { "id": "1", "type": "standard_scaler" },
                { "id": "2", "type": "train_test_split", "params": { "test_size": 0.25 } },
                { "id": "3", "type": "decision_tree_classifier", "params": { "max_depth": 3 } }
            ]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true), "{}", body["logs"]);
    assert_eq!(body["metrics"]["train_samples"], json!(30));
    assert_eq!(body["metrics"]["test_samples"], json!(10));
    let model_path = body["model_path"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/download/{}", model_path))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains(&model_path));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!bytes.is_empty());
}
