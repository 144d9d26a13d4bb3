use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Logical operation against an upstream provider, carried on every
/// provider error so callers can decide retry vs. permanent failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderOperation {
    AddOrder,
    OrderStatus,
    MultiOrderStatus,
    CancelOrders,
    EditLink,
    Services,
    Balance,
    ConnectionTest,
}

/// Failure taxonomy for the provider integration core.
///
/// Configuration errors are detected before any network call and are never
/// retried. Transport, protocol and application-level errors surface the
/// provider name and operation so operators can diagnose upstream issues.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} is misconfigured: {message}")]
    Configuration { provider: String, message: String },

    #[error("{operation} request to provider {provider} failed: {message}")]
    Transport {
        provider: String,
        operation: ProviderOperation,
        message: String,
    },

    #[error("Provider {provider} returned HTTP {status} for {operation}: {message}")]
    Protocol {
        provider: String,
        operation: ProviderOperation,
        status: u16,
        message: String,
    },

    #[error("Provider {provider} rejected {operation}: {message}")]
    Api {
        provider: String,
        operation: ProviderOperation,
        message: String,
    },

    #[error("Could not parse {operation} response from provider {provider}: {message}")]
    Parse {
        provider: String,
        operation: ProviderOperation,
        message: String,
    },

    #[error("Provider {provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: ProviderOperation,
    },
}

impl ProviderError {
    /// HTTP status the provider answered with, when the failure happened at
    /// the protocol layer.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Configuration { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Protocol { provider, .. }
            | Self::Api { provider, .. }
            | Self::Parse { provider, .. }
            | Self::Unsupported { provider, .. } => provider,
        }
    }
}

/// Service-level error type shared by repositories, services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Provider(provider_error) => match provider_error {
                ProviderError::Configuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ProviderError::Unsupported { .. } => StatusCode::BAD_REQUEST,
                ProviderError::Transport { .. }
                | ProviderError::Protocol { .. }
                | ProviderError::Api { .. }
                | ProviderError::Parse { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    ///
    /// Provider errors are surfaced verbatim with their context prefix; they
    /// are admin-facing and operators need the raw upstream message to
    /// diagnose issues. Internal errors return generic messages.
    pub fn response_message(&self) -> String {
        match self {
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Standardized error payload returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Gateway")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_error(kind: &str) -> ProviderError {
        let provider = "Example Provider".to_string();
        match kind {
            "configuration" => ProviderError::Configuration {
                provider,
                message: "blank API key".into(),
            },
            "transport" => ProviderError::Transport {
                provider,
                operation: ProviderOperation::AddOrder,
                message: "connection refused".into(),
            },
            "protocol" => ProviderError::Protocol {
                provider,
                operation: ProviderOperation::Balance,
                status: 503,
                message: "Service Unavailable".into(),
            },
            "api" => ProviderError::Api {
                provider,
                operation: ProviderOperation::AddOrder,
                message: "not_enough_funds".into(),
            },
            _ => ProviderError::Unsupported {
                provider,
                operation: ProviderOperation::EditLink,
            },
        }
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Provider(provider_error("configuration")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Provider(provider_error("transport")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Provider(provider_error("protocol")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Provider(provider_error("api")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Provider(provider_error("unsupported")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn provider_error_exposes_http_status() {
        assert_eq!(provider_error("protocol").http_status(), Some(503));
        assert_eq!(provider_error("transport").http_status(), None);
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("lock poisoned".into()).response_message(),
            "Internal server error"
        );

        // Provider failures are admin-facing and keep the upstream message.
        let msg = ServiceError::Provider(provider_error("api")).response_message();
        assert!(msg.contains("Example Provider"));
        assert!(msg.contains("not_enough_funds"));
    }
}
