//! End-to-end HTTP tests: mock capabilities, scripted browser, real router.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use scanforge_browser::{ScriptedFactory, ScriptedSession};
use scanforge_cache::ResultCache;
use scanforge_core::VisionProvider;
use scanforge_executor::{Executor, ExecutorConfig};
use scanforge_extraction::providers::mock::MockVision;
use scanforge_extraction::{ExtractionConfig, ExtractionGateway};
use scanforge_gateway::{build_router, AppState};
use scanforge_guard::PayloadCodec;
use scanforge_interactions::TableChecker;
use scanforge_orchestrator::Orchestrator;
use scanforge_planner::providers::mock::MockPlanner;
use scanforge_planner::{Planner, PlannerConfig};
use scanforge_resilience::{CircuitConfig, RateConfig, ResilienceWrapper};

const BOUNDARY: &str = "scanforge-test-boundary";

const SCHEMA_JSON: &str = r#"{
    "page_type": "refill_form",
    "url_hint": "https://pharmacy.example.com/refill",
    "elements": [
        {"id": "rx_number", "type": "text_input", "label": "Rx Number"},
        {"id": "submit", "type": "button", "label": "Submit"}
    ]
}"#;

const PRESCRIPTION_JSON: &str =
    r#"{"medications":[{"medication_name":"Metformin","dosage":"500mg","frequency":"twice daily"}]}"#;

const PLAN_JSON: &str = r#"{
    "task": "refill",
    "steps": [
        {"step": 1, "action": "navigate", "target": "https://pharmacy.example.com/refill", "description": "open"},
        {"step": 2, "action": "fill", "target": "rx_number", "value": "RX-1", "description": "enter"},
        {"step": 3, "action": "click", "target": "submit", "description": "submit"}
    ]
}"#;

fn router_with(vision_response: &str, plan_response: &str) -> Router {
    let wrapper = Arc::new(ResilienceWrapper::new(
        CircuitConfig::default(),
        RateConfig::default(),
        Duration::from_secs(1),
    ));
    let cache = Arc::new(ResultCache::in_memory(PayloadCodec::from_passphrase(
        "gateway-test",
    )));
    let extraction = Arc::new(ExtractionGateway::new(
        Arc::new(MockVision::new("mock").with_response(vision_response)) as Arc<dyn VisionProvider>,
        Arc::clone(&wrapper),
        cache,
        ExtractionConfig::default(),
    ));
    let planner = Arc::new(Planner::new(
        Arc::new(MockPlanner::new("mock").with_response(plan_response)),
        Arc::clone(&wrapper),
        PlannerConfig::default(),
    ));
    let executor = Arc::new(Executor::new(ExecutorConfig {
        step_timeout: Duration::from_millis(500),
        capture_screenshot: false,
    }));
    let sessions = Arc::new(ScriptedFactory::new(ScriptedSession::new()));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&extraction),
        planner,
        executor,
        sessions,
    ));

    build_router(AppState {
        orchestrator,
        extraction,
        interactions: Arc::new(TableChecker::new()),
    })
}

fn test_image() -> Vec<u8> {
    let mut img = image::RgbImage::new(32, 32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let v = if (x / 4 + y / 4) % 2 == 0 { 0 } else { 255 };
        *pixel = image::Rgb([v, v, v]);
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// (name, filename, bytes) triplets into one multipart body.
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "scanforge");
}

#[tokio::test]
async fn test_extract_prescription_then_cache_hit() {
    let router = router_with(PRESCRIPTION_JSON, PLAN_JSON);
    let image = test_image();
    let parts = [("file", Some("scan.png"), image.as_slice())];

    let first = router
        .clone()
        .oneshot(multipart_request("/extract-prescription", &parts))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;
    assert_eq!(first["status"], "success");
    assert_eq!(first["cached"], false);
    assert_eq!(first["prescription_info"]["medication_name"], "Metformin");

    let second = router
        .oneshot(multipart_request("/extract-prescription", &parts))
        .await
        .unwrap();
    let second = json_body(second).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["prescription_info"]["medication_name"], "Metformin");
}

#[tokio::test]
async fn test_extract_prescription_missing_file_is_400() {
    let router = router_with(PRESCRIPTION_JSON, PLAN_JSON);
    let response = router
        .oneshot(multipart_request("/extract-prescription", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_check_image_quality() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let image = test_image();
    let response = router
        .oneshot(multipart_request(
            "/check-image-quality",
            &[("file", Some("scan.png"), image.as_slice())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isValid"], true);
    assert!(body["score"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_check_interactions_finds_known_pair() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check-prescription-interactions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"medications": ["Warfarin 5mg", "Aspirin 81mg"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["medications_found"], 2);
    assert_eq!(body["has_interactions"], true);
    assert_eq!(body["interactions"]["major"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["prescription_details"].as_array().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_analyze_and_execute_full_pipeline() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let image = test_image();
    let response = router
        .oneshot(multipart_request(
            "/analyze-and-execute",
            &[
                ("file", Some("scan.png"), image.as_slice()),
                ("intent", None, b"refill my prescription"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["plan"]["steps"].as_array().unwrap().len(), 3);
    assert_eq!(body["execution"]["entries"].as_array().unwrap().len(), 3);
    assert_eq!(body["ui_schema"]["page_type"], "refill_form");
}

#[tokio::test]
async fn test_analyze_missing_intent_is_400() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let image = test_image();
    let response = router
        .oneshot(multipart_request(
            "/analyze-and-execute",
            &[("file", Some("scan.png"), image.as_slice())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_bad_upload_reports_structured_error() {
    let router = router_with(SCHEMA_JSON, PLAN_JSON);
    let response = router
        .oneshot(multipart_request(
            "/analyze-and-execute",
            &[
                ("file", Some("scan.png"), b"not an image".as_slice()),
                ("intent", None, b"refill"),
            ],
        ))
        .await
        .unwrap();

    // Pipeline-stage failures surface in the structured response body.
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("bad input"));
}
