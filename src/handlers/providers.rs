use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::{validate_input, AppState};
use crate::models::{
    ConnectionTestReport, NewProviderOrder, NormalizedOrderResult, NormalizedStatusResult,
    Provider, ProviderBalance, ProviderServiceEntry,
};
use crate::{ApiResponse, ApiResult};

/// Request body for forwarding an order to a provider.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForwardOrderRequest {
    /// Provider-side service identifier
    #[validate(length(min = 1))]
    pub service: String,

    /// Destination link
    #[validate(url)]
    pub link: String,

    #[validate(range(min = 1))]
    pub quantity: u32,

    /// Drip-feed runs (ignored by dialects without drip-feed support)
    #[serde(default)]
    pub runs: Option<u32>,

    /// Drip-feed interval in minutes
    #[serde(default)]
    pub interval: Option<u32>,
}

impl From<ForwardOrderRequest> for NewProviderOrder {
    fn from(request: ForwardOrderRequest) -> Self {
        Self {
            service: request.service,
            link: request.link,
            quantity: request.quantity,
            runs: request.runs,
            interval: request.interval,
        }
    }
}

/// Request body naming provider-side order ids.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OrderIdsRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<String>,
}

/// Request body for changing an order's destination link.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EditLinkRequest {
    #[validate(url)]
    pub link: String,
}

/// Batch status sync outcome: one entry per order id the provider answered
/// for, in the order the ids were supplied.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusSyncResponse {
    #[schema(value_type = Object)]
    pub statuses: IndexMap<String, NormalizedStatusResult>,
    pub requested: usize,
    pub synced: usize,
}

/// Acknowledgement for cancel/edit actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderActionResponse {
    pub message: String,
}

/// List all usable providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    responses(
        (status = 200, description = "Active providers with well-formed configuration", body = ApiResponse<Vec<Provider>>)
    ),
    tag = "Providers"
)]
pub async fn list_providers(State(state): State<AppState>) -> ApiResult<Vec<Provider>> {
    let providers = state.validator.get_valid_providers().await?;
    Ok(Json(ApiResponse::success(providers)))
}

/// Fetch a single provider after pre-flight validation
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider is usable", body = ApiResponse<Provider>),
        (status = 404, description = "Provider not found", body = crate::errors::ErrorResponse),
        (status = 400, description = "Provider failed validation", body = crate::errors::ErrorResponse)
    ),
    tag = "Providers"
)]
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Provider> {
    let provider = state.validator.validate_provider(id).await?;
    Ok(Json(ApiResponse::success(provider)))
}

/// Test connectivity to a provider
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/test",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Connection test outcome", body = ApiResponse<ConnectionTestReport>)
    ),
    tag = "Providers"
)]
pub async fn test_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ConnectionTestReport> {
    let report = state.validator.test_provider_connection(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Fetch the remaining balance at a provider
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}/balance",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider account balance", body = ApiResponse<ProviderBalance>),
        (status = 502, description = "Provider unreachable or rejected the call", body = crate::errors::ErrorResponse)
    ),
    tag = "Providers"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProviderBalance> {
    let provider = state.validator.validate_provider(id).await?;
    let balance = state
        .forwarder
        .get_balance(&provider)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(balance)))
}

/// Fetch a provider's normalized service catalog
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}/services",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Normalized service catalog", body = ApiResponse<Vec<ProviderServiceEntry>>)
    ),
    tag = "Providers"
)]
pub async fn list_services(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ProviderServiceEntry>> {
    let provider = state.validator.validate_provider(id).await?;
    let services = state
        .forwarder
        .get_services(&provider)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(services)))
}

/// Forward an order to a provider
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/orders",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = ForwardOrderRequest,
    responses(
        (status = 200, description = "Order placed with the provider", body = ApiResponse<NormalizedOrderResult>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 502, description = "Provider rejected the order", body = crate::errors::ErrorResponse)
    ),
    tag = "Providers"
)]
pub async fn forward_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ForwardOrderRequest>,
) -> ApiResult<NormalizedOrderResult> {
    validate_input(&payload)?;
    let provider = state.validator.validate_provider(id).await?;
    let result = state
        .forwarder
        .forward_order(&provider, &payload.into())
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(result)))
}

/// Fetch the status of one forwarded order
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}/orders/{order_id}",
    params(
        ("id" = Uuid, Path, description = "Provider id"),
        ("order_id" = String, Path, description = "Provider-side order id")
    ),
    responses(
        (status = 200, description = "Normalized order status", body = ApiResponse<NormalizedStatusResult>)
    ),
    tag = "Providers"
)]
pub async fn order_status(
    State(state): State<AppState>,
    Path((id, order_id)): Path<(Uuid, String)>,
) -> ApiResult<NormalizedStatusResult> {
    let provider = state.validator.validate_provider(id).await?;
    let status = state
        .forwarder
        .check_order_status(&provider, &order_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(status)))
}

/// Re-sync statuses for a batch of forwarded orders
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/orders/status",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = OrderIdsRequest,
    responses(
        (status = 200, description = "Best-effort batch sync result", body = ApiResponse<StatusSyncResponse>)
    ),
    tag = "Providers"
)]
pub async fn sync_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderIdsRequest>,
) -> ApiResult<StatusSyncResponse> {
    validate_input(&payload)?;
    let provider = state.validator.validate_provider(id).await?;
    let requested = payload.order_ids.len();
    let statuses = state
        .forwarder
        .sync_orders_status(&provider, &payload.order_ids)
        .await
        .map_err(ServiceError::from)?;

    let synced = statuses.len();
    Ok(Json(ApiResponse::success(StatusSyncResponse {
        statuses,
        requested,
        synced,
    })))
}

/// Request cancellation of forwarded orders
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/orders/cancel",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = OrderIdsRequest,
    responses(
        (status = 200, description = "Cancellation accepted by the provider", body = ApiResponse<ProviderActionResponse>)
    ),
    tag = "Providers"
)]
pub async fn cancel_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderIdsRequest>,
) -> ApiResult<ProviderActionResponse> {
    validate_input(&payload)?;
    let provider = state.validator.validate_provider(id).await?;
    state
        .forwarder
        .cancel_orders(&provider, &payload.order_ids)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(ApiResponse::success(ProviderActionResponse {
        message: format!(
            "Cancellation requested for {} order(s)",
            payload.order_ids.len()
        ),
    })))
}

/// Change the destination link of a forwarded order
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/orders/{order_id}/link",
    params(
        ("id" = Uuid, Path, description = "Provider id"),
        ("order_id" = String, Path, description = "Provider-side order id")
    ),
    request_body = EditLinkRequest,
    responses(
        (status = 200, description = "Link updated", body = ApiResponse<ProviderActionResponse>),
        (status = 400, description = "Dialect does not support link edits", body = crate::errors::ErrorResponse)
    ),
    tag = "Providers"
)]
pub async fn edit_order_link(
    State(state): State<AppState>,
    Path((id, order_id)): Path<(Uuid, String)>,
    Json(payload): Json<EditLinkRequest>,
) -> ApiResult<ProviderActionResponse> {
    validate_input(&payload)?;
    let provider = state.validator.validate_provider(id).await?;
    state
        .forwarder
        .edit_order_link(&provider, &order_id, &payload.link)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(ApiResponse::success(ProviderActionResponse {
        message: format!("Link updated for order {order_id}"),
    })))
}

pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_providers))
        .route("/:id", get(get_provider))
        .route("/:id/test", post(test_provider))
        .route("/:id/balance", get(get_balance))
        .route("/:id/services", get(list_services))
        .route("/:id/orders", post(forward_order))
        .route("/:id/orders/status", post(sync_orders))
        .route("/:id/orders/cancel", post(cancel_orders))
        .route("/:id/orders/:order_id", get(order_status))
        .route("/:id/orders/:order_id/link", post(edit_order_link))
}
