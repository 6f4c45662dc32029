use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    config::{AppConfig, StoreBackend, default_tax_rate},
    db::{create_orm_conn, run_migrations},
    events::{LogOrderHook, NotifyCustomerHook, OrderHooks},
    repository::{DynStore, MemoryStore, OrmStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub hooks: OrderHooks,
    pub tax_rate: Decimal,
}

impl AppState {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            hooks: OrderHooks::new(),
            tax_rate: default_tax_rate(),
        }
    }

    pub fn with_hooks(mut self, hooks: OrderHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Build the state for the configured backend, migrating Postgres first.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: DynStore = match config.backend {
            StoreBackend::Postgres => {
                let conn = create_orm_conn(config.require_database_url()?).await?;
                run_migrations(&conn).await?;
                Arc::new(OrmStore::new(conn))
            }
            StoreBackend::Memory => {
                tracing::warn!("using the in-memory store; data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };

        let mut hooks = OrderHooks::new().with(Arc::new(LogOrderHook));
        if config.notify_on_checkout {
            hooks.register(Arc::new(NotifyCustomerHook));
        }

        Ok(Self::new(store)
            .with_hooks(hooks)
            .with_tax_rate(config.tax_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_config_builds_state_with_log_hook_only() {
        let state = AppState::from_config(&AppConfig::default()).await.unwrap();
        assert_eq!(state.hooks.len(), 1);
        assert_eq!(state.tax_rate, default_tax_rate());

        let config = AppConfig {
            notify_on_checkout: true,
            ..AppConfig::default()
        };
        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.hooks.len(), 2);
    }
}
