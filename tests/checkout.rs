mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use storefront_api::{
    dto::{
        cart::AddCartItemRequest,
        orders::{CreateOrderRequest, UpdateOrderRequest},
        products::UpdateProductRequest,
    },
    error::{AppError, RepositoryError, Resource},
    middleware::auth::AuthUser,
    models::{OrderItem, PaymentStatus},
    repository::{
        CartItemRepository, CartRepository, CollectionRepository, CustomerRepository,
        LikeRepository, MemoryStore, OrderItemRepository, OrderRepository, ProductRepository,
        RepoResult, ReviewRepository, Store, TagRepository, UnitOfWork,
    },
    services::{cart_service, catalog_service, order_service},
};
use uuid::Uuid;

#[tokio::test]
async fn checkout_turns_cart_into_order_and_removes_cart() {
    let (state, hook) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let b = seed_product(&state, "Beta", 500).await;
    let cart = seed_cart(&state, &[(&a, 2), (&b, 1)]).await;
    let (user, customer) = seed_customer(&state).await;

    let resp = order_service::checkout(&state, &user, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap();
    let order = resp.data.unwrap();

    assert_eq!(order.customer_id, customer.id);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_price, price(2500));

    let alpha = order.items.iter().find(|i| i.product.id == a.id).unwrap();
    assert_eq!(alpha.quantity, 2);
    assert_eq!(alpha.unit_price, price(1000));
    assert_eq!(alpha.total_price, price(2000));

    let err = cart_service::get_cart(&state, cart.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(Resource::Cart)));
    assert_eq!(hook.calls(), 1);
}

#[tokio::test]
async fn empty_cart_is_rejected_without_creating_an_order() {
    let (state, hook) = memory_state();
    let cart = seed_cart(&state, &[]).await;
    let (user, _) = seed_customer(&state).await;

    let err = order_service::checkout(&state, &user, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmptyCart));
    assert_eq!(order_count(&state).await, 0);
    assert!(cart_service::get_cart(&state, cart.id).await.is_ok());
    assert_eq!(hook.calls(), 0);
}

#[tokio::test]
async fn unknown_cart_is_not_found() {
    let (state, hook) = memory_state();
    let (user, _) = seed_customer(&state).await;

    let err = order_service::checkout(
        &state,
        &user,
        CreateOrderRequest {
            cart_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound(Resource::Cart)));
    assert_eq!(hook.calls(), 0);
}

#[tokio::test]
async fn caller_without_customer_profile_cannot_check_out() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[(&a, 1)]).await;
    let stranger = AuthUser::new(Uuid::new_v4());

    let err = order_service::checkout(&state, &stranger, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(Resource::Customer)));
    assert_eq!(order_count(&state).await, 0);
    assert!(cart_service::get_cart(&state, cart.id).await.is_ok());
}

#[tokio::test]
async fn order_lines_keep_the_price_paid() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[(&a, 3)]).await;
    let (user, _) = seed_customer(&state).await;
    let admin = AuthUser::admin(Uuid::new_v4());

    let order = order_service::checkout(&state, &user, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap()
        .data
        .unwrap();

    catalog_service::update_product(
        &state,
        &admin,
        a.id,
        UpdateProductRequest {
            unit_price: Some(price(4200)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let reread = order_service::get_order(&state, &user, order.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(reread.items[0].unit_price, price(1000));
    assert_eq!(reread.items[0].product.unit_price, price(4200));
    assert_eq!(reread.total_price, price(3000));
}

#[tokio::test]
async fn adding_the_same_product_twice_sums_quantities() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[]).await;

    for quantity in [2, 3] {
        cart_service::add_item(
            &state,
            cart.id,
            AddCartItemRequest {
                product_id: a.id,
                quantity,
            },
        )
        .await
        .unwrap();
    }

    let detail = cart_service::get_cart(&state, cart.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(detail.item_count, 1);
    assert_eq!(detail.items[0].quantity, 5);
    assert_eq!(detail.total_price, price(5000));
}

#[tokio::test]
async fn add_item_validates_quantity_and_product() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[(&a, 32_000)]).await;

    let err = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: a.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: a.id,
            quantity: 1_000,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = cart_service::add_item(
        &state,
        cart.id,
        AddCartItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(Resource::Product)));

    let err = cart_service::add_item(
        &state,
        Uuid::new_v4(),
        AddCartItemRequest {
            product_id: a.id,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(Resource::Cart)));
}

#[tokio::test]
async fn product_on_an_order_cannot_be_deleted() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let b = seed_product(&state, "Beta", 500).await;
    let cart = seed_cart(&state, &[(&a, 1)]).await;
    let (user, _) = seed_customer(&state).await;
    let admin = AuthUser::admin(Uuid::new_v4());

    order_service::checkout(&state, &user, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap();

    let err = catalog_service::delete_product(&state, &admin, a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    catalog_service::delete_product(&state, &admin, b.id)
        .await
        .unwrap();
    let err = catalog_service::get_product(&state, b.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(Resource::Product)));
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[(&a, 1)]).await;
    let (owner, _) = seed_customer(&state).await;
    let (other, _) = seed_customer(&state).await;
    let admin = AuthUser::admin(Uuid::new_v4());

    let order = order_service::checkout(&state, &owner, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap()
        .data
        .unwrap();

    let err = order_service::get_order(&state, &other, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(Resource::Order)));

    let listed = order_service::list_orders(&state, &other, Default::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(listed.items.is_empty());

    let listed = order_service::list_orders(&state, &admin, Default::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);

    let err = order_service::update_payment_status(
        &state,
        &owner,
        order.id,
        UpdateOrderRequest {
            payment_status: PaymentStatus::Complete,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let updated = order_service::update_payment_status(
        &state,
        &admin,
        order.id,
        UpdateOrderRequest {
            payment_status: PaymentStatus::Complete,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Complete);
}

/// Order item writes that always fail, to break checkout after the order row
/// has been staged.
struct BrokenOrderItems;

#[async_trait]
impl OrderItemRepository for BrokenOrderItems {
    async fn insert_many(&mut self, _items: Vec<OrderItem>) -> RepoResult<Vec<OrderItem>> {
        Err(RepositoryError::Fault("order_items unavailable".into()))
    }

    async fn for_order(&mut self, _order_id: Uuid) -> RepoResult<Vec<OrderItem>> {
        Ok(Vec::new())
    }

    async fn count_for_product(&mut self, _product_id: Uuid) -> RepoResult<u64> {
        Ok(0)
    }
}

struct BrokenUnitOfWork {
    inner: Box<dyn UnitOfWork>,
    order_items: BrokenOrderItems,
}

#[async_trait]
impl UnitOfWork for BrokenUnitOfWork {
    fn customers(&mut self) -> &mut dyn CustomerRepository {
        self.inner.customers()
    }
    fn products(&mut self) -> &mut dyn ProductRepository {
        self.inner.products()
    }
    fn collections(&mut self) -> &mut dyn CollectionRepository {
        self.inner.collections()
    }
    fn reviews(&mut self) -> &mut dyn ReviewRepository {
        self.inner.reviews()
    }
    fn carts(&mut self) -> &mut dyn CartRepository {
        self.inner.carts()
    }
    fn cart_items(&mut self) -> &mut dyn CartItemRepository {
        self.inner.cart_items()
    }
    fn orders(&mut self) -> &mut dyn OrderRepository {
        self.inner.orders()
    }
    fn order_items(&mut self) -> &mut dyn OrderItemRepository {
        &mut self.order_items
    }
    fn tags(&mut self) -> &mut dyn TagRepository {
        self.inner.tags()
    }
    fn likes(&mut self) -> &mut dyn LikeRepository {
        self.inner.likes()
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.inner.commit().await
    }
}

struct BrokenStore(Arc<MemoryStore>);

#[async_trait]
impl Store for BrokenStore {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(BrokenUnitOfWork {
            inner: self.0.begin().await?,
            order_items: BrokenOrderItems,
        }))
    }
}

#[tokio::test]
async fn failure_after_order_insert_rolls_everything_back() {
    let memory = Arc::new(MemoryStore::new());
    let (healthy, _) = state_with_store(memory.clone());
    let a = seed_product(&healthy, "Alpha", 1000).await;
    let cart = seed_cart(&healthy, &[(&a, 2)]).await;
    let (user, _) = seed_customer(&healthy).await;

    let (broken, hook) = state_with_store(Arc::new(BrokenStore(memory)));
    let err = order_service::checkout(&broken, &user, CreateOrderRequest { cart_id: cart.id })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Repository(RepositoryError::Fault(_))));
    assert_eq!(order_count(&healthy).await, 0);
    let detail = cart_service::get_cart(&healthy, cart.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(detail.items[0].quantity, 2);
    assert_eq!(hook.calls(), 0);
}
