use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Administrative status of a configured provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderStatus {
    #[default]
    Active,
    Inactive,
}

/// HTTP method a provider dialect expects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

/// Body encoding a provider dialect expects for non-GET requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestFormat {
    #[default]
    Form,
    Json,
}

/// Administrator-configured upstream vendor record.
///
/// Owned by configuration storage; the integration core only reads it.
/// `http_method`, `request_format`, `api_type` and `timeout_secs` are
/// optional overrides; unset fields fall back to the most common provider
/// dialect family when the specification is derived.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Provider {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[validate(length(min = 1))]
    pub name: String,

    #[validate(url)]
    pub api_url: String,

    /// Never echoed back through the API surface.
    #[serde(skip_serializing)]
    #[validate(length(min = 1))]
    pub api_key: String,

    #[serde(default)]
    pub status: ProviderStatus,

    #[serde(default)]
    pub http_method: Option<HttpMethod>,

    #[serde(default)]
    pub request_format: Option<RequestFormat>,

    /// Numeric dialect family discriminator as persisted by admin tooling.
    #[serde(default)]
    pub api_type: Option<u8>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Optional override endpoint used only for order placement.
    #[serde(default)]
    pub add_order_url: Option<String>,
}

impl Provider {
    pub fn is_active(&self) -> bool {
        self.status == ProviderStatus::Active
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
