//! Normalizes provider response bodies, tolerating the field-name variance
//! between dialects.
//!
//! Extraction works off ordered candidate-key tables: for each logical
//! field the first present, non-null value wins. The tables are pure data;
//! supporting a new dialect's field names is an addition to a table, not a
//! code change.

use indexmap::IndexMap;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::{ProviderError, ProviderOperation};
use crate::models::{
    NormalizedOrderResult, NormalizedStatusResult, OrderStatus, ProviderBalance,
    ProviderServiceEntry,
};

const ORDER_ID_KEYS: &[&str] = &["order", "order_id", "id"];
const CHARGE_KEYS: &[&str] = &["charge", "price", "cost"];
const STATUS_KEYS: &[&str] = &["status", "order_status"];
const REMAINS_KEYS: &[&str] = &["remains", "remaining"];
const START_COUNT_KEYS: &[&str] = &["start_count", "startCount", "start"];
const BALANCE_KEYS: &[&str] = &["balance", "funds"];
const CURRENCY_KEYS: &[&str] = &["currency"];
const SERVICE_ID_KEYS: &[&str] = &["service", "service_id", "id"];
const SERVICE_NAME_KEYS: &[&str] = &["name", "title"];
const SERVICE_RATE_KEYS: &[&str] = &["rate", "price"];
const SERVICE_MIN_KEYS: &[&str] = &["min", "min_order"];
const SERVICE_MAX_KEYS: &[&str] = &["max", "max_order"];
const SERVICE_CATEGORY_KEYS: &[&str] = &["category", "cat"];
const SERVICE_DESCRIPTION_KEYS: &[&str] = &["desc", "description"];
const SERVICES_LIST_KEYS: &[&str] = &["services", "data"];

/// Context threaded through parsing so failures carry the provider and
/// operation they belong to.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub provider: &'a str,
    pub operation: ProviderOperation,
    pub default_currency: &'a str,
}

impl ResponseContext<'_> {
    fn api_error(&self, message: String) -> ProviderError {
        ProviderError::Api {
            provider: self.provider.to_string(),
            operation: self.operation,
            message,
        }
    }

    fn parse_error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Parse {
            provider: self.provider.to_string(),
            operation: self.operation,
            message: message.into(),
        }
    }
}

/// Extracts an application-level error from a response body.
///
/// A top-level `error` field signals failure when present and truthy;
/// `false`, `null`, the empty string and numeric zero are treated as "no
/// error" since some dialects emit them on success.
pub fn application_error(body: &Value) -> Option<String> {
    let err = body.get("error")?;
    match err {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("provider reported an unspecified error".to_string()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn ensure_no_application_error(ctx: &ResponseContext<'_>, body: &Value) -> Result<(), ProviderError> {
    match application_error(body) {
        Some(message) => Err(ctx.api_error(message)),
        None => Ok(()),
    }
}

pub fn parse_order_response(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<NormalizedOrderResult, ProviderError> {
    ensure_no_application_error(ctx, body)?;

    // The order id is the one mandatory field: nothing downstream can track
    // the order without it.
    let order_id = string_field(body, ORDER_ID_KEYS)
        .ok_or_else(|| ctx.parse_error("response did not contain an order id"))?;

    Ok(NormalizedOrderResult {
        order_id,
        charge: decimal_field(body, CHARGE_KEYS),
        start_count: integer_field(body, START_COUNT_KEYS),
        status: status_field(body),
        remains: integer_field(body, REMAINS_KEYS),
        currency: currency_field(ctx, body),
    })
}

pub fn parse_status_response(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<NormalizedStatusResult, ProviderError> {
    ensure_no_application_error(ctx, body)?;

    Ok(NormalizedStatusResult {
        charge: decimal_field(body, CHARGE_KEYS),
        start_count: integer_field(body, START_COUNT_KEYS),
        status: status_field(body),
        remains: integer_field(body, REMAINS_KEYS),
        currency: currency_field(ctx, body),
    })
}

/// Parses a batch status response keyed by provider order id. Individual
/// entries can fail (e.g. `{"error": "Incorrect order ID"}`) without
/// failing the batch; the per-id result carries the failure.
pub fn parse_multi_status_response(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<IndexMap<String, Result<NormalizedStatusResult, ProviderError>>, ProviderError> {
    ensure_no_application_error(ctx, body)?;

    let entries = body
        .as_object()
        .ok_or_else(|| ctx.parse_error("expected an object keyed by order id"))?;

    let mut results = IndexMap::with_capacity(entries.len());
    for (order_id, entry) in entries {
        results.insert(order_id.clone(), parse_status_response(ctx, entry));
    }
    Ok(results)
}

pub fn parse_balance_response(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<ProviderBalance, ProviderError> {
    ensure_no_application_error(ctx, body)?;

    let balance = decimal_field(body, BALANCE_KEYS)
        .ok_or_else(|| ctx.parse_error("response did not contain a balance"))?;

    Ok(ProviderBalance {
        balance,
        currency: currency_field(ctx, body),
    })
}

pub fn parse_services_response(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<Vec<ProviderServiceEntry>, ProviderError> {
    ensure_no_application_error(ctx, body)?;

    let list = if let Some(list) = body.as_array() {
        list
    } else {
        first_present(body, SERVICES_LIST_KEYS)
            .and_then(Value::as_array)
            .ok_or_else(|| ctx.parse_error("response did not contain a service list"))?
    };

    // Elements without a service id are dropped: a row the panel cannot
    // reference is useless.
    Ok(list
        .iter()
        .filter_map(|entry| {
            let provider_service_id = string_field(entry, SERVICE_ID_KEYS)?;
            Some(ProviderServiceEntry {
                provider_service_id,
                name: string_field(entry, SERVICE_NAME_KEYS).unwrap_or_default(),
                rate: decimal_field(entry, SERVICE_RATE_KEYS),
                min_order: integer_field(entry, SERVICE_MIN_KEYS),
                max_order: integer_field(entry, SERVICE_MAX_KEYS),
                category: string_field(entry, SERVICE_CATEGORY_KEYS),
                description: string_field(entry, SERVICE_DESCRIPTION_KEYS),
            })
        })
        .collect())
}

/// Confirms a response carries no application-level error, discarding any
/// payload. Used for operations whose body has no normalized shape
/// (cancellations, link edits).
pub fn parse_acknowledgement(
    ctx: &ResponseContext<'_>,
    body: &Value,
) -> Result<(), ProviderError> {
    ensure_no_application_error(ctx, body)
}

fn first_present<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(key))
        .find(|value| !value.is_null())
}

fn string_field(body: &Value, keys: &[&str]) -> Option<String> {
    match first_present(body, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A value that fails to parse as a number is treated as absent, not zero:
/// callers must be able to tell "not reported" from "reported zero".
fn decimal_field(body: &Value, keys: &[&str]) -> Option<Decimal> {
    match first_present(body, keys)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn integer_field(body: &Value, keys: &[&str]) -> Option<i64> {
    match first_present(body, keys)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn status_field(body: &Value) -> OrderStatus {
    string_field(body, STATUS_KEYS)
        .map(|raw| OrderStatus::from_provider_label(&raw))
        .unwrap_or_default()
}

fn currency_field(ctx: &ResponseContext<'_>, body: &Value) -> String {
    string_field(body, CURRENCY_KEYS).unwrap_or_else(|| ctx.default_currency.to_string())
}
