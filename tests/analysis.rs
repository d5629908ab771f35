//! Gemini analyzer integration tests
//!
//! Runs the analyzer against a local fake of the `generateContent` endpoint

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};

use vision_aid::config::AnalyzerConfig;
use vision_aid::{AnalysisResult, Analyzer, CapturedImage, GeminiAnalyzer, PromptVariant};

const MODEL: &str = "gemini-test";

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl FakeGemini {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            delay: Duration::ZERO,
            seen: Arc::default(),
        }
    }

    fn text(text: &str) -> Self {
        Self::new(
            StatusCode::OK,
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }),
        )
    }
}

async fn generate(
    State(fake): State<FakeGemini>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((key, body));

    tokio::time::sleep(fake.delay).await;
    (fake.status, Json(fake.reply.clone()))
}

/// Serve the fake and return its base URL
async fn serve(fake: FakeGemini) -> String {
    let app = Router::new()
        .route(&format!("/models/{MODEL}:generateContent"), post(generate))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn analyzer(endpoint: String, timeout: Option<Duration>) -> GeminiAnalyzer {
    GeminiAnalyzer::new(AnalyzerConfig {
        api_key: Some(SecretString::from("test-key")),
        model: MODEL.to_string(),
        endpoint,
        timeout,
    })
    .unwrap()
}

fn image_in(dir: &tempfile::TempDir) -> CapturedImage {
    let path = dir.path().join("captured_image.jpg");
    std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
    CapturedImage {
        path,
        width: 800,
        height: 600,
    }
}

#[tokio::test]
async fn test_success_returns_trimmed_text() {
    let fake = FakeGemini::text("  a red mug on a wooden table\n");
    let seen = Arc::clone(&fake.seen);
    let analyzer = analyzer(serve(fake).await, None);
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::Describe)
        .await;

    assert_eq!(
        result,
        AnalysisResult::Success("a red mug on a wooden table".to_string())
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("test-key"));
}

#[tokio::test]
async fn test_request_carries_prompt_and_image() {
    let fake = FakeGemini::text("person looks tired");
    let seen = Arc::clone(&fake.seen);
    let analyzer = analyzer(serve(fake).await, None);
    let dir = tempfile::tempdir().unwrap();

    analyzer
        .analyze(&image_in(&dir), PromptVariant::Emotion)
        .await;

    let seen = seen.lock().unwrap();
    let parts = &seen[0].1["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], PromptVariant::Emotion.prompt());
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
    assert_eq!(parts[1]["inline_data"]["data"], "/9j/4AAQ");
}

#[tokio::test]
async fn test_blank_text_is_empty_response() {
    let analyzer = analyzer(serve(FakeGemini::text("   ")).await, None);
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::ReadText)
        .await;

    assert_eq!(result, AnalysisResult::failure("empty response"));
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let fake = FakeGemini::new(StatusCode::OK, json!({ "candidates": [] }));
    let analyzer = analyzer(serve(fake).await, None);
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::IdentifyObject)
        .await;

    assert_eq!(result, AnalysisResult::failure("empty response"));
}

#[tokio::test]
async fn test_http_error_becomes_failure() {
    let fake = FakeGemini::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "backend exploded" } }),
    );
    let analyzer = analyzer(serve(fake).await, None);
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::Describe)
        .await;

    let AnalysisResult::Failure(reason) = result else {
        panic!("expected failure, got {result:?}");
    };
    assert!(reason.contains("500"), "{reason}");
}

#[tokio::test]
async fn test_missing_file_is_reported() {
    let analyzer = analyzer("http://127.0.0.1:9".to_string(), None);
    let dir = tempfile::tempdir().unwrap();
    let image = CapturedImage {
        path: dir.path().join("gone.jpg"),
        width: 800,
        height: 600,
    };

    let result = analyzer.analyze(&image, PromptVariant::Describe).await;

    let AnalysisResult::Failure(reason) = result else {
        panic!("expected failure, got {result:?}");
    };
    assert!(reason.starts_with("file not found"), "{reason}");
}

#[tokio::test]
async fn test_unreachable_service_becomes_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let analyzer = analyzer(format!("http://{addr}"), None);
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::Describe)
        .await;

    assert!(!result.is_success());
}

#[tokio::test]
async fn test_timeout_becomes_failure() {
    let mut fake = FakeGemini::text("too late");
    fake.delay = Duration::from_secs(5);
    let analyzer = analyzer(serve(fake).await, Some(Duration::from_millis(100)));
    let dir = tempfile::tempdir().unwrap();

    let result = analyzer
        .analyze(&image_in(&dir), PromptVariant::Describe)
        .await;

    assert!(!result.is_success());
}

#[test]
fn test_missing_key_is_rejected() {
    let result = GeminiAnalyzer::new(AnalyzerConfig {
        api_key: None,
        model: MODEL.to_string(),
        endpoint: "http://127.0.0.1:9".to_string(),
        timeout: None,
    });

    assert!(matches!(result, Err(vision_aid::Error::Config(_))));
}
