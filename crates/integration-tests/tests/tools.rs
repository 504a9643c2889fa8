//! Integration tests for tool execution against the fixture shop.
//!
//! Covers page artifacts, the payment QR display and recoverable tool
//! failures. QR images are written into temporary directories.

use serde_json::json;
use shopping_assistant::artifacts::{HTML_ARTIFACT, PAYMENT_QR_ARTIFACT};
use shopping_assistant::tools::{ToolError, ToolExecutor, shopping_tools};
use shopping_assistant::{DirectoryArtifacts, InMemoryArtifacts, PaymentDisplay};
use shopping_assistant_integration_tests::{session, shop_data};

const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

fn qr_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("qr1.jpg");
    std::fs::write(&path, FAKE_JPEG).expect("write qr");
    path
}

// =============================================================================
// Tool Definitions
// =============================================================================

#[test]
fn test_three_tools_are_offered() {
    let names: Vec<String> = shopping_tools().into_iter().map(|tool| tool.name).collect();
    assert_eq!(names, vec!["search", "click", "show_payment_qr"]);
}

// =============================================================================
// Search and Click
// =============================================================================

#[tokio::test]
async fn test_search_then_click_publishes_each_page() {
    let data = shop_data();
    let mut session = session(&data);
    let artifacts = InMemoryArtifacts::new();
    let payment = PaymentDisplay::default();
    let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

    let results = executor
        .execute("search", &json!({"keywords": "blue t-shirt"}))
        .await
        .expect("search");
    assert!(results.contains("B0BLUETEE"));

    let item = executor
        .execute("click", &json!({"button_name": "B0BLUETEE"}))
        .await
        .expect("click");
    assert!(item.contains("Title: Blue Cotton T-Shirt"));

    assert_eq!(artifacts.version_count(HTML_ARTIFACT), 2);
    let latest = artifacts.latest(HTML_ARTIFACT).expect("html artifact");
    assert_eq!(latest.mime_type, "text/html");
    assert!(String::from_utf8_lossy(&latest.data).contains("product-image"));
}

#[tokio::test]
async fn test_invalid_calls_are_errors() {
    let data = shop_data();
    let mut session = session(&data);
    let artifacts = InMemoryArtifacts::new();
    let payment = PaymentDisplay::default();
    let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

    let missing = executor.execute("click", &json!({})).await;
    assert!(matches!(
        missing,
        Err(ToolError::MissingField { field: "button_name", .. })
    ));

    let unknown = executor.execute("checkout", &json!({})).await;
    assert!(matches!(unknown, Err(ToolError::UnknownTool(name)) if name == "checkout"));

    executor
        .execute("search", &json!({"keywords": "mug"}))
        .await
        .expect("executor still usable");
    assert_eq!(artifacts.version_count(HTML_ARTIFACT), 1);
}

// =============================================================================
// Payment QR
// =============================================================================

#[tokio::test]
async fn test_payment_qr_is_saved_as_jpeg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = shop_data();
    let mut session = session(&data);
    let artifacts = InMemoryArtifacts::new();
    let payment = PaymentDisplay::new(qr_file(&dir));
    let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

    let message = executor
        .execute("show_payment_qr", &json!({}))
        .await
        .expect("show qr");

    assert!(message.contains("QR code for payment has been displayed"));
    let qr = artifacts.latest(PAYMENT_QR_ARTIFACT).expect("qr artifact");
    assert_eq!(qr.mime_type, "image/jpeg");
    assert_eq!(qr.data, FAKE_JPEG);
}

#[tokio::test]
async fn test_missing_payment_qr_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("qr_payments/qr1.jpg");
    let data = shop_data();
    let mut session = session(&data);
    let artifacts = InMemoryArtifacts::new();
    let payment = PaymentDisplay::new(&missing);
    let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

    let message = executor
        .execute("show_payment_qr", &json!({}))
        .await
        .expect("show qr");

    assert_eq!(
        message,
        format!("Error: QR code file not found at {}", missing.display())
    );
    assert_eq!(artifacts.version_count(PAYMENT_QR_ARTIFACT), 0);
}

#[tokio::test]
async fn test_directory_artifacts_are_written_to_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("artifacts");
    let data = shop_data();
    let mut session = session(&data);
    let artifacts = DirectoryArtifacts::new(&out);
    let payment = PaymentDisplay::new(qr_file(&dir));
    let mut executor = ToolExecutor::new(&mut session, &artifacts, &payment);

    executor
        .execute("search", &json!({"keywords": "blue t-shirt"}))
        .await
        .expect("search");
    executor
        .execute("show_payment_qr", &json!({}))
        .await
        .expect("show qr");

    let html = std::fs::read_to_string(out.join("html.html")).expect("html artifact");
    assert!(html.contains("product-link"));
    assert_eq!(std::fs::read(out.join("payment_qr.jpg")).expect("qr artifact"), FAKE_JPEG);
}
