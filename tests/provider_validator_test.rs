//! Integration tests for provider pre-flight validation and the
//! connection test, including the sandbox short-circuit.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use smm_provider_api::errors::ServiceError;
use smm_provider_api::models::ProviderStatus;

#[tokio::test]
async fn validate_provider_returns_the_loaded_record() {
    let app = TestApp::new().await;
    let id = app.seed_provider(app.upstream_provider("Wholesale SMM"));

    let provider = app
        .state
        .validator
        .validate_provider(id)
        .await
        .expect("provider should validate");
    assert_eq!(provider.name, "Wholesale SMM");
}

#[tokio::test]
async fn validate_provider_rejects_unknown_inactive_and_misconfigured() {
    let app = TestApp::new().await;

    let err = app
        .state
        .validator
        .validate_provider(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let mut inactive = app.upstream_provider("Paused Vendor");
    inactive.status = ProviderStatus::Inactive;
    let id = app.seed_provider(inactive);
    let err = app.state.validator.validate_provider(id).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("inactive"));

    let mut keyless = app.upstream_provider("Keyless Vendor");
    keyless.api_key = "   ".into();
    let id = app.seed_provider(keyless);
    let err = app.state.validator.validate_provider(id).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("API key"));

    let mut garbage = app.upstream_provider("Garbage Vendor");
    garbage.api_url = "not a url".into();
    let id = app.seed_provider(garbage);
    let err = app.state.validator.validate_provider(id).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(ref msg) if msg.contains("URL"));
}

#[tokio::test]
async fn valid_provider_listing_excludes_active_rows_with_garbage_urls() {
    let app = TestApp::new().await;

    app.seed_provider(app.upstream_provider("Good Vendor"));

    // Active, non-blank key, but the URL does not parse.
    let mut garbage = app.upstream_provider("Garbage Vendor");
    garbage.api_url = "not a url".into();
    let garbage_id = app.seed_provider(garbage);

    let valid = app
        .state
        .validator
        .get_valid_providers()
        .await
        .expect("listing should succeed");

    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].name, "Good Vendor");

    // The garbage row is excluded, not deactivated.
    let still_there = app
        .state
        .providers
        .find_by_id(garbage_id)
        .await
        .unwrap()
        .unwrap();
    assert!(still_there.is_active());
}

#[tokio::test]
async fn sandbox_signature_short_circuits_without_a_network_call() {
    let app = TestApp::new().await;

    // Any request reaching the upstream double fails the test on drop.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&app.upstream)
        .await;

    let mut sandbox = app.upstream_provider("Config Test Vendor");
    sandbox.api_key = "test_abc123".into();
    let id = app.seed_provider(sandbox);

    let report = app
        .state
        .validator
        .test_provider_connection(id)
        .await
        .expect("connection test should report");

    assert!(report.success);
    assert!(report.message.contains("skipped"));
}

#[tokio::test]
async fn connection_test_fetches_the_service_list() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/v2"))
        .and(body_string_contains("action=services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"service": 101, "name": "Followers"},
            {"service": 102, "name": "Views"}
        ])))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let id = app.seed_provider(app.upstream_provider("Wholesale SMM"));
    let report = app
        .state
        .validator
        .test_provider_connection(id)
        .await
        .expect("connection test should report");

    assert!(report.success);
    assert!(report.message.contains("2 services"));
}

#[tokio::test]
async fn connection_test_reports_failures_with_a_message() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&app.upstream)
        .await;

    let id = app.seed_provider(app.upstream_provider("Flaky Vendor"));
    let report = app
        .state
        .validator
        .test_provider_connection(id)
        .await
        .expect("connection test should report");

    assert!(!report.success);
    assert!(report.message.contains("500"));
}
