//! Post-checkout hooks. Hooks run after the checkout transaction has
//! committed, in registration order; a failing hook is logged and skipped.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

/// What a hook gets to see of a freshly placed order.
#[derive(Debug, Clone)]
pub struct OrderCreated {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user_id: Uuid,
}

impl OrderCreated {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::total_price).sum()
    }
}

#[async_trait]
pub trait OrderCreatedHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_order_created(&self, event: &OrderCreated) -> anyhow::Result<()>;
}

pub type DynOrderCreatedHook = Arc<dyn OrderCreatedHook>;

#[derive(Clone, Default)]
pub struct OrderHooks {
    hooks: Vec<DynOrderCreatedHook>,
}

impl OrderHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hook: DynOrderCreatedHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn register(&mut self, hook: DynOrderCreatedHook) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn order_created(&self, event: &OrderCreated) {
        for hook in &self.hooks {
            if let Err(err) = hook.on_order_created(event).await {
                tracing::warn!(
                    hook = hook.name(),
                    order_id = %event.order.id,
                    error = %err,
                    "order hook failed"
                );
            }
        }
    }
}

pub struct LogOrderHook;

#[async_trait]
impl OrderCreatedHook for LogOrderHook {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn on_order_created(&self, event: &OrderCreated) -> anyhow::Result<()> {
        tracing::info!(
            order_id = %event.order.id,
            customer_id = %event.order.customer_id,
            items = event.items.len(),
            total = %event.total(),
            "order created"
        );
        Ok(())
    }
}

/// Fire-and-forget customer notification. The send runs on a detached task;
/// its outcome never reaches the checkout caller.
pub struct NotifyCustomerHook;

#[async_trait]
impl OrderCreatedHook for NotifyCustomerHook {
    fn name(&self) -> &'static str {
        "notify_customer"
    }

    async fn on_order_created(&self, event: &OrderCreated) -> anyhow::Result<()> {
        let order_id = event.order.id;
        let user_id = event.user_id;
        let total = event.total();
        tokio::spawn(async move {
            tracing::info!(
                %order_id,
                %user_id,
                %total,
                "sending order confirmation"
            );
        });
        Ok(())
    }
}
