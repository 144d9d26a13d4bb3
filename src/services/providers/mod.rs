//! Provider integration core: translates between the panel's internal
//! order/status/balance contract and the heterogeneous APIs of upstream
//! SMM providers.

pub mod forwarder;
pub mod request;
pub mod response;
pub mod spec;
pub mod validator;

pub use forwarder::{calculate_provider_cost, OrderForwarder};
pub use request::ProviderRequest;
pub use spec::{ApiDialect, LogicalParam, ProviderSpec};
pub use validator::{validate_provider_record, ProviderValidator};
