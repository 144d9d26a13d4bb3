use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::Provider;

/// Read-only access to administrator-configured provider records.
///
/// Provider storage is owned by admin configuration; the integration core
/// only consumes it through this seam. Persistence-backed implementations
/// live with the callers; the in-memory implementation below is seeded
/// from configuration at startup and used by the test harness.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>, ServiceError>;

    async fn list_all(&self) -> Result<Vec<Provider>, ServiceError>;

    async fn list_active(&self) -> Result<Vec<Provider>, ServiceError>;
}

/// Provider registry held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryProviderRepository {
    providers: RwLock<HashMap<Uuid, Provider>>,
}

impl InMemoryProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(providers: impl IntoIterator<Item = Provider>) -> Self {
        let repository = Self::new();
        for provider in providers {
            // Seeding happens before the registry is shared; a poisoned lock
            // is unreachable here.
            if let Ok(mut guard) = repository.providers.write() {
                guard.insert(provider.id, provider);
            }
        }
        repository
    }

    pub fn insert(&self, provider: Provider) -> Result<(), ServiceError> {
        let mut guard = self
            .providers
            .write()
            .map_err(|_| ServiceError::InternalError("provider registry lock poisoned".into()))?;
        guard.insert(provider.id, provider);
        Ok(())
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>, ServiceError> {
        let guard = self
            .providers
            .read()
            .map_err(|_| ServiceError::InternalError("provider registry lock poisoned".into()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Provider>, ServiceError> {
        let guard = self
            .providers
            .read()
            .map_err(|_| ServiceError::InternalError("provider registry lock poisoned".into()))?;
        let mut providers: Vec<Provider> = guard.values().cloned().collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    async fn list_active(&self) -> Result<Vec<Provider>, ServiceError> {
        let providers = self.list_all().await?;
        Ok(providers.into_iter().filter(Provider::is_active).collect())
    }
}
