pub mod provider_repository;

pub use provider_repository::{InMemoryProviderRepository, ProviderRepository};
