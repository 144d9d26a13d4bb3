use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::errors::ProviderError;
use crate::models::{HttpMethod, Provider, RequestFormat};

/// Default timeout for outbound provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Logical request parameters the integration core knows about. Each
/// provider dialect maps these onto its own parameter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LogicalParam {
    ApiKey,
    Action,
    OrderId,
    OrderIds,
    Link,
    Service,
    Quantity,
    Runs,
    Interval,
}

/// Known provider dialect families.
///
/// Adding a dialect is a new variant plus exhaustive-match updates, checked
/// at compile time, never a string comparison against a raw `api_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDialect {
    /// The common panel dialect: drip-feed and link edits supported.
    Standard,
    /// Reduced dialect: no drip-feed parameters, no order-link edits.
    Lite,
}

impl ApiDialect {
    fn from_api_type(provider: &Provider) -> Result<Self, ProviderError> {
        match provider.api_type {
            None | Some(1) => Ok(Self::Standard),
            Some(3) => Ok(Self::Lite),
            Some(other) => Err(ProviderError::Configuration {
                provider: provider.name.clone(),
                message: format!("unknown api_type {other}"),
            }),
        }
    }

    pub fn supports_drip_feed(self) -> bool {
        match self {
            Self::Standard => true,
            Self::Lite => false,
        }
    }

    pub fn supports_link_edit(self) -> bool {
        match self {
            Self::Standard => true,
            Self::Lite => false,
        }
    }

    /// Separator used when batching order ids into one request.
    pub fn id_separator(self) -> &'static str {
        match self {
            Self::Standard | Self::Lite => ",",
        }
    }
}

/// Immutable description of one provider's API dialect, derived once per
/// forwarding call from the persisted provider record. Unset provider
/// fields fall back to the most common dialect family defaults.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub provider_name: String,
    pub api_key: String,
    pub api_url: Url,
    pub add_order_url: Option<Url>,
    pub params: HashMap<LogicalParam, String>,
    pub request_format: RequestFormat,
    pub http_method: HttpMethod,
    pub timeout: Duration,
    pub dialect: ApiDialect,
}

impl ProviderSpec {
    pub fn from_provider(provider: &Provider) -> Result<Self, ProviderError> {
        let dialect = ApiDialect::from_api_type(provider)?;

        let api_url = Url::parse(provider.api_url.trim()).map_err(|err| {
            ProviderError::Configuration {
                provider: provider.name.clone(),
                message: format!("malformed api_url `{}`: {err}", provider.api_url),
            }
        })?;

        let add_order_url = provider
            .add_order_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw.trim()).map_err(|err| ProviderError::Configuration {
                    provider: provider.name.clone(),
                    message: format!("malformed add_order_url `{raw}`: {err}"),
                })
            })
            .transpose()?;

        let mut params = default_params();
        if !dialect.supports_drip_feed() {
            params.remove(&LogicalParam::Runs);
            params.remove(&LogicalParam::Interval);
        }

        Ok(Self {
            provider_name: provider.name.clone(),
            api_key: provider.api_key.clone(),
            api_url,
            add_order_url,
            params,
            request_format: provider.request_format.unwrap_or_default(),
            http_method: provider.http_method.unwrap_or_default(),
            timeout: provider
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            dialect,
        })
    }

    /// Resolves a logical parameter to the provider's parameter name,
    /// failing fast when the mapping has no entry for it.
    pub fn param(&self, param: LogicalParam) -> Result<&str, ProviderError> {
        self.params
            .get(&param)
            .map(String::as_str)
            .ok_or_else(|| ProviderError::Configuration {
                provider: self.provider_name.clone(),
                message: format!("no parameter mapping for `{param}`"),
            })
    }

    /// Endpoint for order placement; falls back to the base API URL when no
    /// override is configured.
    pub fn add_order_endpoint(&self) -> &Url {
        self.add_order_url.as_ref().unwrap_or(&self.api_url)
    }
}

fn default_params() -> HashMap<LogicalParam, String> {
    [
        (LogicalParam::ApiKey, "key"),
        (LogicalParam::Action, "action"),
        (LogicalParam::OrderId, "order"),
        (LogicalParam::OrderIds, "orders"),
        (LogicalParam::Link, "link"),
        (LogicalParam::Service, "service"),
        (LogicalParam::Quantity, "quantity"),
        (LogicalParam::Runs, "runs"),
        (LogicalParam::Interval, "interval"),
    ]
    .into_iter()
    .map(|(param, name)| (param, name.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderStatus;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn provider() -> Provider {
        Provider {
            id: Uuid::new_v4(),
            name: "Example Provider".into(),
            api_url: "https://example-provider.com/api/v2".into(),
            api_key: "secret".into(),
            status: ProviderStatus::Active,
            http_method: None,
            request_format: None,
            api_type: None,
            timeout_secs: None,
            add_order_url: None,
        }
    }

    #[test]
    fn defaults_match_the_common_dialect_family() {
        let spec = ProviderSpec::from_provider(&provider()).unwrap();

        assert_eq!(spec.http_method, HttpMethod::Post);
        assert_eq!(spec.request_format, RequestFormat::Form);
        assert_eq!(spec.timeout, DEFAULT_TIMEOUT);
        assert_eq!(spec.dialect, ApiDialect::Standard);
        assert_eq!(spec.param(LogicalParam::ApiKey).unwrap(), "key");
        assert_eq!(spec.param(LogicalParam::OrderId).unwrap(), "order");
        assert_eq!(spec.param(LogicalParam::Quantity).unwrap(), "quantity");
    }

    #[test]
    fn provider_overrides_are_honored() {
        let mut p = provider();
        p.http_method = Some(HttpMethod::Get);
        p.request_format = Some(RequestFormat::Json);
        p.timeout_secs = Some(5);
        p.add_order_url = Some("https://example-provider.com/api/v2/order".into());

        let spec = ProviderSpec::from_provider(&p).unwrap();
        assert_eq!(spec.http_method, HttpMethod::Get);
        assert_eq!(spec.request_format, RequestFormat::Json);
        assert_eq!(spec.timeout, Duration::from_secs(5));
        assert_eq!(
            spec.add_order_endpoint().as_str(),
            "https://example-provider.com/api/v2/order"
        );
    }

    #[test]
    fn lite_dialect_drops_drip_feed_mappings() {
        let mut p = provider();
        p.api_type = Some(3);

        let spec = ProviderSpec::from_provider(&p).unwrap();
        assert_eq!(spec.dialect, ApiDialect::Lite);
        assert_matches!(
            spec.param(LogicalParam::Runs),
            Err(ProviderError::Configuration { .. })
        );
        assert_matches!(
            spec.param(LogicalParam::Interval),
            Err(ProviderError::Configuration { .. })
        );
    }

    #[test]
    fn unknown_api_type_is_a_configuration_error() {
        let mut p = provider();
        p.api_type = Some(7);

        assert_matches!(
            ProviderSpec::from_provider(&p),
            Err(ProviderError::Configuration { .. })
        );
    }

    #[test]
    fn malformed_api_url_is_a_configuration_error() {
        let mut p = provider();
        p.api_url = "not a url".into();

        assert_matches!(
            ProviderSpec::from_provider(&p),
            Err(ProviderError::Configuration { .. })
        );
    }
}
