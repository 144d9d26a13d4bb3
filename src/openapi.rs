use utoipa::OpenApi;

use crate::errors::ErrorResponse;
use crate::handlers::providers::{
    EditLinkRequest, ForwardOrderRequest, OrderIdsRequest, ProviderActionResponse,
    StatusSyncResponse,
};
use crate::models::{
    ConnectionTestReport, NewProviderOrder, NormalizedOrderResult, NormalizedStatusResult,
    OrderStatus, Provider, ProviderBalance, ProviderServiceEntry, ProviderStatus,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SMM Provider API",
        version = "0.1.0",
        description = "Provider integration service for an SMM reseller panel. \
            Normalizes heterogeneous upstream provider APIs (parameter names, \
            encodings, status vocabularies) into one internal order, status and \
            balance contract."
    ),
    paths(
        crate::handlers::providers::list_providers,
        crate::handlers::providers::get_provider,
        crate::handlers::providers::test_provider,
        crate::handlers::providers::get_balance,
        crate::handlers::providers::list_services,
        crate::handlers::providers::forward_order,
        crate::handlers::providers::order_status,
        crate::handlers::providers::sync_orders,
        crate::handlers::providers::cancel_orders,
        crate::handlers::providers::edit_order_link,
    ),
    components(schemas(
        Provider,
        ProviderStatus,
        OrderStatus,
        NewProviderOrder,
        NormalizedOrderResult,
        NormalizedStatusResult,
        ProviderBalance,
        ProviderServiceEntry,
        ConnectionTestReport,
        ForwardOrderRequest,
        OrderIdsRequest,
        EditLinkRequest,
        StatusSyncResponse,
        ProviderActionResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Providers", description = "Upstream provider integration: forwarding, status sync, balances, catalogs")
    )
)]
pub struct ApiDoc;
