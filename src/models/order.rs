use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Internal order status vocabulary. Provider status strings are always
/// reduced to this closed set; callers never see a raw provider string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Partial,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Maps a provider's status label (case-insensitive) onto the internal
    /// vocabulary. Unrecognized labels fall back to `Pending` so a provider
    /// introducing a new label degrades to "still being worked on" instead
    /// of failing the sync.
    pub fn from_provider_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "in progress" | "processing" => Self::Processing,
            "completed" => Self::Completed,
            "partial" => Self::Partial,
            "canceled" | "cancelled" => Self::Cancelled,
            "failed" | "error" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Arguments for placing an order with an upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewProviderOrder {
    /// Provider-side service identifier.
    #[validate(length(min = 1))]
    pub service: String,

    /// Destination link the engagement is delivered to.
    #[validate(url)]
    pub link: String,

    #[validate(range(min = 1))]
    pub quantity: u32,

    /// Drip-feed runs; only forwarded to dialects that support drip-feed.
    #[serde(default)]
    pub runs: Option<u32>,

    /// Drip-feed interval in minutes; same dialect rule as `runs`.
    #[serde(default)]
    pub interval: Option<u32>,
}

/// Normalized outcome of an order placement, independent of which provider
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedOrderResult {
    pub order_id: String,
    /// Absent when the provider did not report a charge; never coerced to zero.
    pub charge: Option<Decimal>,
    pub start_count: Option<i64>,
    pub status: OrderStatus,
    pub remains: Option<i64>,
    pub currency: String,
}

/// Normalized outcome of a status check for an already-placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedStatusResult {
    pub charge: Option<Decimal>,
    pub start_count: Option<i64>,
    pub status: OrderStatus,
    pub remains: Option<i64>,
    pub currency: String,
}

/// Provider account balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderBalance {
    pub balance: Decimal,
    pub currency: String,
}

/// One row of a provider's service catalog, normalized from whatever field
/// names the provider uses natively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderServiceEntry {
    pub provider_service_id: String,
    pub name: String,
    pub rate: Option<Decimal>,
    pub min_order: Option<i64>,
    pub max_order: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Outcome of a provider connection test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionTestReport {
    pub success: bool,
    pub message: String,
}
