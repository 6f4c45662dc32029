#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use storefront_api::{
    events::{OrderCreated, OrderCreatedHook, OrderHooks},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, Customer, Membership, Product},
    repository::{CustomerProfile, DynStore, MemoryStore},
    state::AppState,
};
use uuid::Uuid;

/// Counts how often checkout reported a new order.
#[derive(Default)]
pub struct CountingHook(pub AtomicUsize);

impl CountingHook {
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderCreatedHook for CountingHook {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn on_order_created(&self, _event: &OrderCreated) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn memory_state() -> (AppState, Arc<CountingHook>) {
    let store: DynStore = Arc::new(MemoryStore::new());
    state_with_store(store)
}

pub fn state_with_store(store: DynStore) -> (AppState, Arc<CountingHook>) {
    let hook = Arc::new(CountingHook::default());
    let state = AppState::new(store).with_hooks(OrderHooks::new().with(hook.clone()));
    (state, hook)
}

pub fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn seed_product(state: &AppState, title: &str, cents: i64) -> Product {
    let mut uow = state.store.begin().await.unwrap();
    let product = uow
        .products()
        .insert(Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            description: None,
            unit_price: price(cents),
            inventory: 100,
            last_update: Utc::now(),
            collection_id: None,
        })
        .await
        .unwrap();
    uow.commit().await.unwrap();
    product
}

pub async fn seed_cart(state: &AppState, lines: &[(&Product, i32)]) -> Cart {
    let mut uow = state.store.begin().await.unwrap();
    let cart = uow
        .carts()
        .insert(Cart {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    for (product, quantity) in lines {
        uow.cart_items()
            .insert(CartItem {
                id: Uuid::new_v4(),
                cart_id: cart.id,
                product_id: product.id,
                quantity: *quantity,
            })
            .await
            .unwrap();
    }
    uow.commit().await.unwrap();
    cart
}

pub async fn seed_customer(state: &AppState) -> (AuthUser, Customer) {
    let user = AuthUser::new(Uuid::new_v4());
    let mut uow = state.store.begin().await.unwrap();
    let customer = uow
        .customers()
        .upsert(
            user.user_id,
            CustomerProfile {
                phone: "555-0100".to_string(),
                birth_date: None,
                membership: Membership::Bronze,
            },
        )
        .await
        .unwrap();
    uow.commit().await.unwrap();
    (user, customer)
}

pub async fn order_count(state: &AppState) -> u64 {
    let mut uow = state.store.begin().await.unwrap();
    let (_, total) = uow
        .orders()
        .list(&storefront_api::repository::OrderFilter {
            limit: 100,
            ..Default::default()
        })
        .await
        .unwrap();
    total
}
