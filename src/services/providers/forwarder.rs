//! Composes the request builder and response parser around an HTTP call and
//! applies the cross-cutting policy: per-call timeouts, error precedence,
//! sequential batch sync.
//!
//! The forwarder never retries. Retry policy belongs to the caller because
//! retry-safety differs by operation: status checks are idempotent, order
//! placement is not and can double-charge the provider.

use std::time::Duration;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::errors::{ProviderError, ProviderOperation, ServiceError};
use crate::models::{
    NewProviderOrder, NormalizedOrderResult, NormalizedStatusResult, Provider, ProviderBalance,
    ProviderServiceEntry,
};

use super::request::{self, ProviderRequest};
use super::response::{self, ResponseContext};
use super::spec::ProviderSpec;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest provider response excerpt carried in protocol error messages.
const ERROR_BODY_EXCERPT: usize = 200;

/// Stateless gateway to upstream providers. Holds only the shared HTTP
/// client and the panel's fallback currency; all durable state lives with
/// the callers.
pub struct OrderForwarder {
    client: reqwest::Client,
    default_currency: String,
}

impl OrderForwarder {
    pub fn new(default_currency: impl Into<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|err| ServiceError::InternalError(format!("http client: {err}")))?;

        Ok(Self {
            client,
            default_currency: default_currency.into(),
        })
    }

    /// Places an order with the provider and returns the normalized result.
    ///
    /// A response-level `error` field takes precedence over HTTP success;
    /// a missing order id in an otherwise successful response is a hard
    /// failure.
    #[instrument(skip(self, provider, order), fields(provider = %provider.name))]
    pub async fn forward_order(
        &self,
        provider: &Provider,
        order: &NewProviderOrder,
    ) -> Result<NormalizedOrderResult, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        let request = request::add_order(&spec, order)?;
        let body = self
            .execute(provider, ProviderOperation::AddOrder, request, spec.timeout)
            .await?;
        let result = response::parse_order_response(
            &self.ctx(provider, ProviderOperation::AddOrder),
            &body,
        )?;

        info!(
            provider = %provider.name,
            provider_order_id = %result.order_id,
            status = %result.status,
            "order forwarded to provider"
        );
        Ok(result)
    }

    /// Fetches the current status of a single already-placed order.
    #[instrument(skip(self, provider), fields(provider = %provider.name))]
    pub async fn check_order_status(
        &self,
        provider: &Provider,
        provider_order_id: &str,
    ) -> Result<NormalizedStatusResult, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        self.status_with_spec(&spec, provider, provider_order_id)
            .await
    }

    /// Fetches statuses for several orders in one batched provider call.
    /// Per-id failures inside the batch response are logged and excluded.
    #[instrument(skip(self, provider, provider_order_ids), fields(provider = %provider.name))]
    pub async fn check_orders_status(
        &self,
        provider: &Provider,
        provider_order_ids: &[String],
    ) -> Result<IndexMap<String, NormalizedStatusResult>, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        let request = request::multi_order_status(&spec, provider_order_ids)?;
        let body = self
            .execute(
                provider,
                ProviderOperation::MultiOrderStatus,
                request,
                spec.timeout,
            )
            .await?;

        let parsed = response::parse_multi_status_response(
            &self.ctx(provider, ProviderOperation::MultiOrderStatus),
            &body,
        )?;

        let mut results = IndexMap::with_capacity(parsed.len());
        for (order_id, entry) in parsed {
            match entry {
                Ok(status) => {
                    results.insert(order_id, status);
                }
                Err(err) => {
                    warn!(
                        provider = %provider.name,
                        order_id = %order_id,
                        error = %err,
                        "batch status entry failed; excluded from result"
                    );
                }
            }
        }
        Ok(results)
    }

    /// Re-queries each order's status with one provider call per id.
    ///
    /// Iteration is strictly sequential as a throttle against upstream rate
    /// limits. A failure on one id is logged and excluded rather than
    /// aborting the batch; partial success is the expected steady state.
    /// Results keep the supplied id order.
    #[instrument(skip(self, provider, provider_order_ids), fields(provider = %provider.name))]
    pub async fn sync_orders_status(
        &self,
        provider: &Provider,
        provider_order_ids: &[String],
    ) -> Result<IndexMap<String, NormalizedStatusResult>, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;

        let mut results = IndexMap::with_capacity(provider_order_ids.len());
        for order_id in provider_order_ids {
            match self.status_with_spec(&spec, provider, order_id).await {
                Ok(status) => {
                    results.insert(order_id.clone(), status);
                }
                Err(err) => {
                    warn!(
                        provider = %provider.name,
                        order_id = %order_id,
                        error = %err,
                        "status sync failed for order; continuing batch"
                    );
                }
            }
        }
        Ok(results)
    }

    /// Fetches the provider's service catalog.
    pub async fn get_services(
        &self,
        provider: &Provider,
    ) -> Result<Vec<ProviderServiceEntry>, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        self.services_with_timeout(&spec, provider, spec.timeout)
            .await
    }

    /// Catalog fetch with a caller-supplied timeout bound; used by the
    /// validator's connection test which runs on a shorter leash.
    pub async fn get_services_with_timeout(
        &self,
        provider: &Provider,
        timeout: Duration,
    ) -> Result<Vec<ProviderServiceEntry>, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        self.services_with_timeout(&spec, provider, timeout).await
    }

    /// Fetches the remaining account balance at the provider.
    #[instrument(skip(self, provider), fields(provider = %provider.name))]
    pub async fn get_balance(&self, provider: &Provider) -> Result<ProviderBalance, ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        let request = request::balance(&spec)?;
        let body = self
            .execute(provider, ProviderOperation::Balance, request, spec.timeout)
            .await?;
        response::parse_balance_response(&self.ctx(provider, ProviderOperation::Balance), &body)
    }

    /// Requests cancellation for a batch of orders.
    #[instrument(skip(self, provider, provider_order_ids), fields(provider = %provider.name))]
    pub async fn cancel_orders(
        &self,
        provider: &Provider,
        provider_order_ids: &[String],
    ) -> Result<(), ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        let request = request::cancel_orders(&spec, provider_order_ids)?;
        let body = self
            .execute(
                provider,
                ProviderOperation::CancelOrders,
                request,
                spec.timeout,
            )
            .await?;
        response::parse_acknowledgement(&self.ctx(provider, ProviderOperation::CancelOrders), &body)
    }

    /// Changes the destination link of an already-placed order, on dialects
    /// that support it.
    #[instrument(skip(self, provider, link), fields(provider = %provider.name))]
    pub async fn edit_order_link(
        &self,
        provider: &Provider,
        provider_order_id: &str,
        link: &str,
    ) -> Result<(), ProviderError> {
        let spec = ProviderSpec::from_provider(provider)?;
        let request = request::edit_link(&spec, provider_order_id, link)?;
        let body = self
            .execute(provider, ProviderOperation::EditLink, request, spec.timeout)
            .await?;
        response::parse_acknowledgement(&self.ctx(provider, ProviderOperation::EditLink), &body)
    }

    /// Boolean liveness probe: does a balance fetch succeed. All failures
    /// collapse to `false` by contract.
    pub async fn test_connection(&self, provider: &Provider) -> bool {
        self.get_balance(provider).await.is_ok()
    }

    async fn status_with_spec(
        &self,
        spec: &ProviderSpec,
        provider: &Provider,
        provider_order_id: &str,
    ) -> Result<NormalizedStatusResult, ProviderError> {
        let request = request::order_status(spec, provider_order_id)?;
        let body = self
            .execute(
                provider,
                ProviderOperation::OrderStatus,
                request,
                spec.timeout,
            )
            .await?;
        response::parse_status_response(&self.ctx(provider, ProviderOperation::OrderStatus), &body)
    }

    async fn services_with_timeout(
        &self,
        spec: &ProviderSpec,
        provider: &Provider,
        timeout: Duration,
    ) -> Result<Vec<ProviderServiceEntry>, ProviderError> {
        let request = request::services(spec)?;
        let body = self
            .execute(provider, ProviderOperation::Services, request, timeout)
            .await?;
        response::parse_services_response(&self.ctx(provider, ProviderOperation::Services), &body)
    }

    /// Executes one provider call. Timeouts and connection failures are
    /// reported uniformly as transport errors; a non-2xx answer becomes a
    /// protocol error carrying the HTTP status.
    async fn execute(
        &self,
        provider: &Provider,
        operation: ProviderOperation,
        request: ProviderRequest,
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), request.url.clone())
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let transport = |err: reqwest::Error| ProviderError::Transport {
            provider: provider.name.clone(),
            operation,
            message: err.to_string(),
        };

        let response = builder.send().await.map_err(&transport)?;
        let status = response.status();
        let text = response.text().await.map_err(&transport)?;

        if !status.is_success() {
            return Err(ProviderError::Protocol {
                provider: provider.name.clone(),
                operation,
                status: status.as_u16(),
                message: excerpt(&text),
            });
        }

        serde_json::from_str(&text).map_err(|err| ProviderError::Parse {
            provider: provider.name.clone(),
            operation,
            message: format!("invalid JSON: {err}"),
        })
    }

    fn ctx<'a>(
        &'a self,
        provider: &'a Provider,
        operation: ProviderOperation,
    ) -> ResponseContext<'a> {
        ResponseContext {
            provider: &provider.name,
            operation,
            default_currency: &self.default_currency,
        }
    }
}

/// Cost of an order against a provider, with the reseller markup applied.
/// Rates follow the SMM-industry convention of cost per 1000 units.
pub fn calculate_provider_cost(
    rate_per_thousand: Decimal,
    quantity: u32,
    markup_percent: Decimal,
) -> Decimal {
    let base = rate_per_thousand / dec!(1000) * Decimal::from(quantity);
    base * (Decimal::ONE + markup_percent / dec!(100))
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT).collect();
        format!("{cut}...")
    }
}
