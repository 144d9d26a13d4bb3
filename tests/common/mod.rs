#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

use smm_provider_api::{
    app_router,
    config::AppConfig,
    models::{Provider, ProviderStatus},
    repositories::InMemoryProviderRepository,
    AppState,
};

/// Helper harness wiring the application state to an in-memory provider
/// registry and a wiremock double standing in for the upstream provider.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub registry: Arc<InMemoryProviderRepository>,
    pub upstream: MockServer,
}

impl TestApp {
    pub async fn new() -> Self {
        let upstream = MockServer::start().await;
        let registry = Arc::new(InMemoryProviderRepository::new());
        let state = AppState::with_repository(AppConfig::default(), registry.clone())
            .expect("failed to build app state");
        let router = app_router(state.clone());

        Self {
            router,
            state,
            registry,
            upstream,
        }
    }

    /// A provider record pointing at the wiremock upstream.
    pub fn upstream_provider(&self, name: &str) -> Provider {
        Provider {
            id: Uuid::new_v4(),
            name: name.into(),
            api_url: format!("{}/api/v2", self.upstream.uri()),
            api_key: "live_key".into(),
            status: ProviderStatus::Active,
            http_method: None,
            request_format: None,
            api_type: None,
            timeout_secs: None,
            add_order_url: None,
        }
    }

    pub fn seed_provider(&self, provider: Provider) -> Uuid {
        let id = provider.id;
        self.registry.insert(provider).expect("failed to seed provider");
        id
    }

    pub async fn get(&self, path: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_json(&self, path: &str, payload: Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
