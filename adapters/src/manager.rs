//! Provider registry (holds every configured adapter)

use crate::{
    adapter::ProviderAdapter, config::Config, context::RequestContext, sicoob::SicoobAdapter,
    sicredi::SicrediAdapter, types::ProviderKind, Error, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Outcome of one provider health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Provider
    pub provider: ProviderKind,
    /// Whether a valid token could be obtained
    pub healthy: bool,
    /// Failure description
    pub error: Option<String>,
    /// When the check ran
    pub checked_at: DateTime<Utc>,
}

/// Adapters by provider
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: Arc<RwLock<HashMap<ProviderKind, Arc<dyn ProviderAdapter>>>>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register an adapter for every configured provider
    pub async fn from_config(config: &Config) -> Result<Self> {
        let registry = Self::new();
        if let Some(sicoob) = &config.sicoob {
            registry
                .register(Arc::new(SicoobAdapter::new(sicoob.clone())?))
                .await;
        }
        if let Some(sicredi) = &config.sicredi {
            registry
                .register(Arc::new(SicrediAdapter::new(sicredi.clone())?))
                .await;
        }
        Ok(registry)
    }

    /// Register an adapter, replacing any previous one for the same provider
    pub async fn register(&self, adapter: Arc<dyn ProviderAdapter>) {
        let mut adapters = self.adapters.write().await;
        info!("Registered {} adapter", adapter.provider_name());
        adapters.insert(adapter.kind(), adapter);
    }

    /// Adapter for `kind`
    pub async fn get(&self, kind: ProviderKind) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .read()
            .await
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::Config(format!("{} adapter is not configured", kind)))
    }

    /// Adapter by provider name, case-insensitive
    pub async fn get_by_name(&self, name: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.get(name.parse()?).await
    }

    /// Registered providers, in a stable order
    pub async fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.adapters.read().await.keys().copied().collect();
        kinds.sort_by_key(|k| k.name());
        kinds
    }

    /// Run every adapter's health check
    pub async fn health_report(&self, ctx: &RequestContext) -> Vec<ProviderHealth> {
        let adapters: Vec<_> = {
            let adapters = self.adapters.read().await;
            let mut list: Vec<_> = adapters.values().cloned().collect();
            list.sort_by_key(|a| a.kind().name());
            list
        };

        let mut report = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let result = adapter.health_check(ctx).await;
            if let Err(e) = &result {
                error!("Health check failed for {}: {}", adapter.provider_name(), e);
            }
            report.push(ProviderHealth {
                provider: adapter.kind(),
                healthy: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
                checked_at: Utc::now(),
            });
        }
        report
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SicrediConfig;

    fn sicredi() -> SicrediConfig {
        SicrediConfig {
            api_key: "key".into(),
            username: "123450101".into(),
            password: "secret".into(),
            cooperative: "0101".into(),
            branch: "02".into(),
            beneficiary_code: "12345".into(),
            environment: Default::default(),
            tls: None,
            http: Default::default(),
            endpoints: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_lookup_by_kind_and_name() {
        let config = Config {
            sicoob: None,
            sicredi: Some(sicredi()),
        };
        let registry = ProviderRegistry::from_config(&config).await.unwrap();
        assert_eq!(registry.providers().await, vec![ProviderKind::Sicredi]);
        assert_eq!(
            registry.get_by_name("sicredi").await.unwrap().provider_name(),
            "SICREDI"
        );
        assert!(matches!(
            registry.get(ProviderKind::Sicoob).await,
            Err(Error::Config(_))
        ));
        assert!(registry.get_by_name("itau").await.is_err());
    }
}
