//! SMM Provider API Library
//!
//! This crate provides the provider integration core of an SMM reseller
//! panel: the component that normalizes heterogeneous third-party provider
//! APIs into one internal request/response contract, forwards orders,
//! syncs statuses and reconciles balances.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};

use repositories::{InMemoryProviderRepository, ProviderRepository};
use services::providers::{OrderForwarder, ProviderValidator};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub providers: Arc<dyn ProviderRepository>,
    pub forwarder: Arc<OrderForwarder>,
    pub validator: Arc<ProviderValidator>,
}

impl AppState {
    /// Builds the application state with a provider registry seeded from
    /// configuration.
    pub fn new(config: config::AppConfig) -> Result<Self, errors::ServiceError> {
        let repository = Arc::new(InMemoryProviderRepository::seeded(config.providers.clone()));
        Self::with_repository(config, repository)
    }

    /// Builds the application state around a caller-supplied provider
    /// repository. Used by deployments with their own storage and by the
    /// test harness.
    pub fn with_repository(
        config: config::AppConfig,
        repository: Arc<dyn ProviderRepository>,
    ) -> Result<Self, errors::ServiceError> {
        let forwarder = Arc::new(OrderForwarder::new(config.default_currency.clone())?);
        let validator = Arc::new(ProviderValidator::new(
            repository.clone(),
            forwarder.clone(),
        ));

        Ok(Self {
            config,
            providers: repository,
            forwarder,
            validator,
        })
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/providers", handlers::providers::provider_routes())
}

/// Builds the full application router with middleware layers applied.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .route("/api/docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "smm-provider-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    // The provider registry is the only stateful collaborator.
    let registry_status = match state.providers.list_all().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": registry_status,
        "checks": {
            "provider_registry": registry_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
