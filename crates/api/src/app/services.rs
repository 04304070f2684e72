use std::sync::Arc;

use taxtally_auth::TokenService;
use taxtally_infra::{InMemoryTaxStore, TaxStore};

use crate::config::{AppConfig, StoreConfig};

/// Shared handles handed to handlers via `Extension`.
pub struct AppServices {
    store: Arc<dyn TaxStore>,
    tokens: TokenService,
}

impl AppServices {
    pub fn new(store: Arc<dyn TaxStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Wire up services for `config`, selecting the storage backend.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = build_store(&config.store).await?;
        let tokens = TokenService::new(config.jwt_secret.as_bytes());
        Ok(Self::new(store, tokens))
    }

    pub fn store(&self) -> &Arc<dyn TaxStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn TaxStore>> {
    match config {
        StoreConfig::InMemory => {
            tracing::info!(store = "in-memory", "storage backend selected");
            Ok(Arc::new(InMemoryTaxStore::new()))
        }
        StoreConfig::Postgres { database_url } => persistent_store(database_url).await,
    }
}

#[cfg(feature = "postgres")]
async fn persistent_store(database_url: &str) -> anyhow::Result<Arc<dyn TaxStore>> {
    use anyhow::Context;

    let store = taxtally_infra::PostgresTaxStore::connect(database_url)
        .await
        .context("failed to connect to postgres")?;
    tracing::info!(store = "postgres", "storage backend selected");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn persistent_store(_database_url: &str) -> anyhow::Result<Arc<dyn TaxStore>> {
    tracing::warn!(
        "USE_PERSISTENT_STORE=true but the postgres feature is not enabled, falling back to in-memory"
    );
    Ok(Arc::new(InMemoryTaxStore::new()))
}
