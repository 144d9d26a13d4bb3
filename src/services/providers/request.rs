//! Translates logical operations into concrete HTTP request descriptors,
//! using the parameter names, method and body encoding the target dialect
//! expects.

use serde_json::Value;
use url::Url;

use crate::errors::{ProviderError, ProviderOperation};
use crate::models::{HttpMethod, NewProviderOrder, RequestFormat};

use super::spec::{LogicalParam, ProviderSpec};

const ACTION_ADD: &str = "add";
const ACTION_STATUS: &str = "status";
const ACTION_CANCEL: &str = "cancel";
const ACTION_SERVICES: &str = "services";
const ACTION_BALANCE: &str = "balance";
const ACTION_EDIT: &str = "edit";

/// Concrete HTTP request descriptor, ready to be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

pub fn add_order(
    spec: &ProviderSpec,
    order: &NewProviderOrder,
) -> Result<ProviderRequest, ProviderError> {
    let mut params = base_params(spec, ACTION_ADD)?;
    params.push((spec.param(LogicalParam::Service)?.to_string(), order.service.clone()));
    params.push((spec.param(LogicalParam::Link)?.to_string(), order.link.clone()));
    params.push((
        spec.param(LogicalParam::Quantity)?.to_string(),
        order.quantity.to_string(),
    ));

    // Dialects without drip-feed support silently omit these parameters.
    if spec.dialect.supports_drip_feed() {
        if let Some(runs) = order.runs {
            params.push((spec.param(LogicalParam::Runs)?.to_string(), runs.to_string()));
        }
        if let Some(interval) = order.interval {
            params.push((
                spec.param(LogicalParam::Interval)?.to_string(),
                interval.to_string(),
            ));
        }
    }

    encode(spec, spec.add_order_endpoint().clone(), params)
}

pub fn order_status(
    spec: &ProviderSpec,
    provider_order_id: &str,
) -> Result<ProviderRequest, ProviderError> {
    let mut params = base_params(spec, ACTION_STATUS)?;
    params.push((
        spec.param(LogicalParam::OrderId)?.to_string(),
        provider_order_id.to_string(),
    ));
    encode(spec, spec.api_url.clone(), params)
}

pub fn multi_order_status(
    spec: &ProviderSpec,
    provider_order_ids: &[String],
) -> Result<ProviderRequest, ProviderError> {
    let mut params = base_params(spec, ACTION_STATUS)?;
    params.push((
        spec.param(LogicalParam::OrderIds)?.to_string(),
        join_ids(spec, provider_order_ids),
    ));
    encode(spec, spec.api_url.clone(), params)
}

pub fn cancel_orders(
    spec: &ProviderSpec,
    provider_order_ids: &[String],
) -> Result<ProviderRequest, ProviderError> {
    let mut params = base_params(spec, ACTION_CANCEL)?;
    params.push((
        spec.param(LogicalParam::OrderIds)?.to_string(),
        join_ids(spec, provider_order_ids),
    ));
    encode(spec, spec.api_url.clone(), params)
}

pub fn services(spec: &ProviderSpec) -> Result<ProviderRequest, ProviderError> {
    let params = base_params(spec, ACTION_SERVICES)?;
    encode(spec, spec.api_url.clone(), params)
}

pub fn balance(spec: &ProviderSpec) -> Result<ProviderRequest, ProviderError> {
    let params = base_params(spec, ACTION_BALANCE)?;
    encode(spec, spec.api_url.clone(), params)
}

/// Builds a link-edit request. Dialects whose `api_type` does not support
/// order edits get a typed "unsupported" error instead of a malformed
/// request.
pub fn edit_link(
    spec: &ProviderSpec,
    provider_order_id: &str,
    link: &str,
) -> Result<ProviderRequest, ProviderError> {
    if !spec.dialect.supports_link_edit() {
        return Err(ProviderError::Unsupported {
            provider: spec.provider_name.clone(),
            operation: ProviderOperation::EditLink,
        });
    }

    let mut params = base_params(spec, ACTION_EDIT)?;
    params.push((
        spec.param(LogicalParam::OrderId)?.to_string(),
        provider_order_id.to_string(),
    ));
    params.push((spec.param(LogicalParam::Link)?.to_string(), link.to_string()));
    encode(spec, spec.api_url.clone(), params)
}

/// Every operation authenticates with the configured key parameter and
/// names its action.
fn base_params(spec: &ProviderSpec, action: &str) -> Result<Vec<(String, String)>, ProviderError> {
    Ok(vec![
        (spec.param(LogicalParam::ApiKey)?.to_string(), spec.api_key.clone()),
        (spec.param(LogicalParam::Action)?.to_string(), action.to_string()),
    ])
}

fn join_ids(spec: &ProviderSpec, ids: &[String]) -> String {
    ids.join(spec.dialect.id_separator())
}

fn encode(
    spec: &ProviderSpec,
    endpoint: Url,
    params: Vec<(String, String)>,
) -> Result<ProviderRequest, ProviderError> {
    match spec.http_method {
        HttpMethod::Get => {
            let mut url = endpoint;
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            Ok(ProviderRequest {
                url,
                method: HttpMethod::Get,
                headers: Vec::new(),
                body: None,
            })
        }
        HttpMethod::Post => match spec.request_format {
            RequestFormat::Json => {
                let map: serde_json::Map<String, Value> = params
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                Ok(ProviderRequest {
                    url: endpoint,
                    method: HttpMethod::Post,
                    headers: vec![("content-type".into(), "application/json".into())],
                    body: Some(Value::Object(map).to_string()),
                })
            }
            RequestFormat::Form => {
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                Ok(ProviderRequest {
                    url: endpoint,
                    method: HttpMethod::Post,
                    headers: vec![(
                        "content-type".into(),
                        "application/x-www-form-urlencoded".into(),
                    )],
                    body: Some(body),
                })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, ProviderStatus};
    use assert_matches::assert_matches;
    use std::collections::HashMap;
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

    fn spec() -> ProviderSpec {
        ProviderSpec::from_provider(&provider()).unwrap()
    }

    fn order() -> NewProviderOrder {
        NewProviderOrder {
            service: "101".into(),
            link: "https://social.example/p/abc".into(),
            quantity: 250,
            runs: None,
            interval: None,
        }
    }

    fn form_pairs(body: &str) -> HashMap<String, String> {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn form_body_reproduces_the_parameter_map() {
        let request = add_order(&spec(), &order()).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.headers,
            vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )]
        );

        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert_eq!(pairs["key"], "secret");
        assert_eq!(pairs["action"], "add");
        assert_eq!(pairs["service"], "101");
        assert_eq!(pairs["link"], "https://social.example/p/abc");
        assert_eq!(pairs["quantity"], "250");
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn json_body_parses_back_to_the_parameter_map() {
        let mut p = provider();
        p.request_format = Some(crate::models::RequestFormat::Json);
        let spec = ProviderSpec::from_provider(&p).unwrap();

        let request = add_order(&spec, &order()).unwrap();
        assert_eq!(
            request.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );

        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["key"], "secret");
        assert_eq!(body["action"], "add");
        assert_eq!(body["quantity"], "250");
        assert_eq!(body.as_object().unwrap().len(), 5);
    }

    #[test]
    fn get_requests_carry_parameters_in_the_query_string() {
        let mut p = provider();
        p.http_method = Some(HttpMethod::Get);
        let spec = ProviderSpec::from_provider(&p).unwrap();

        let request = order_status(&spec, "4711").unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.body.is_none());

        let pairs: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
        assert_eq!(pairs["key"], "secret");
        assert_eq!(pairs["action"], "status");
        assert_eq!(pairs["order"], "4711");
    }

    #[test]
    fn drip_feed_parameters_included_when_the_dialect_supports_them() {
        let mut o = order();
        o.runs = Some(10);
        o.interval = Some(30);

        let request = add_order(&spec(), &o).unwrap();
        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert_eq!(pairs["runs"], "10");
        assert_eq!(pairs["interval"], "30");
    }

    #[test]
    fn drip_feed_parameters_silently_omitted_on_lite_dialect() {
        let mut p = provider();
        p.api_type = Some(3);
        let spec = ProviderSpec::from_provider(&p).unwrap();

        let mut o = order();
        o.runs = Some(10);
        o.interval = Some(30);

        let request = add_order(&spec, &o).unwrap();
        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert!(!pairs.contains_key("runs"));
        assert!(!pairs.contains_key("interval"));
        assert_eq!(pairs["quantity"], "250");
    }

    #[test]
    fn missing_parameter_mapping_fails_fast() {
        let mut spec = spec();
        spec.params.remove(&LogicalParam::Link);

        assert_matches!(
            add_order(&spec, &order()),
            Err(ProviderError::Configuration { .. })
        );
    }

    #[test]
    fn batch_ids_are_joined_with_the_dialect_separator() {
        let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let request = multi_order_status(&spec(), &ids).unwrap();
        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert_eq!(pairs["orders"], "1,2,3");
        assert_eq!(pairs["action"], "status");

        let request = cancel_orders(&spec(), &ids).unwrap();
        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert_eq!(pairs["orders"], "1,2,3");
        assert_eq!(pairs["action"], "cancel");
    }

    #[test]
    fn edit_link_is_unsupported_on_lite_dialect() {
        let mut p = provider();
        p.api_type = Some(3);
        let spec = ProviderSpec::from_provider(&p).unwrap();

        assert_matches!(
            edit_link(&spec, "4711", "https://social.example/p/new"),
            Err(ProviderError::Unsupported {
                operation: ProviderOperation::EditLink,
                ..
            })
        );
    }

    #[test]
    fn edit_link_builds_on_standard_dialect() {
        let request = edit_link(&spec(), "4711", "https://social.example/p/new").unwrap();
        let pairs = form_pairs(request.body.as_deref().unwrap());
        assert_eq!(pairs["action"], "edit");
        assert_eq!(pairs["order"], "4711");
        assert_eq!(pairs["link"], "https://social.example/p/new");
    }

    #[test]
    fn add_order_uses_the_override_endpoint_when_configured() {
        let mut p = provider();
        p.add_order_url = Some("https://example-provider.com/api/v2/special".into());
        let spec = ProviderSpec::from_provider(&p).unwrap();

        let request = add_order(&spec, &order()).unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://example-provider.com/api/v2/special"
        );

        // Other operations keep using the base endpoint.
        let request = balance(&spec).unwrap();
        assert_eq!(request.url.as_str(), "https://example-provider.com/api/v2");
    }
}
