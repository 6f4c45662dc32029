//! Data access layer.
//!
//! Every entity has its own repository trait. A [`Store`] hands out a
//! [`UnitOfWork`], which scopes one transaction and exposes all repositories
//! for that transaction. Nothing is visible to other units of work until
//! [`UnitOfWork::commit`] succeeds; dropping a unit of work rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::RepositoryError,
    models::{
        Cart, CartItem, CartLine, Collection, Customer, LikedItem, Membership, Order, OrderItem,
        PaymentStatus, Product, Review, Tag, TaggedItem, TaggedKind,
    },
};

pub mod memory;
pub mod orm;

pub use memory::MemoryStore;
pub use orm::OrmStore;

pub type RepoResult<T> = Result<T, RepositoryError>;

pub type DynStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    fn customers(&mut self) -> &mut dyn CustomerRepository;
    fn products(&mut self) -> &mut dyn ProductRepository;
    fn collections(&mut self) -> &mut dyn CollectionRepository;
    fn reviews(&mut self) -> &mut dyn ReviewRepository;
    fn carts(&mut self) -> &mut dyn CartRepository;
    fn cart_items(&mut self) -> &mut dyn CartItemRepository;
    fn orders(&mut self) -> &mut dyn OrderRepository;
    fn order_items(&mut self) -> &mut dyn OrderItemRepository;
    fn tags(&mut self) -> &mut dyn TagRepository;
    fn likes(&mut self) -> &mut dyn LikeRepository;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

#[async_trait]
pub trait CustomerRepository: Send {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Customer>>;
    async fn find_by_user(&mut self, user_id: Uuid) -> RepoResult<Option<Customer>>;
    /// Insert the profile for `user_id`, or overwrite the existing one.
    async fn upsert(&mut self, user_id: Uuid, profile: CustomerProfile) -> RepoResult<Customer>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Title,
    UnitPrice,
    LastUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the title or description. `%` and `_`
    /// match themselves.
    pub search: Option<String>,
    pub collection_id: Option<Uuid>,
    /// Exclusive lower bound on the unit price.
    pub price_above: Option<Decimal>,
    /// Exclusive upper bound on the unit price.
    pub price_below: Option<Decimal>,
    pub sort: ProductSort,
    pub direction: SortDirection,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub unit_price: Option<Decimal>,
    pub inventory: Option<i32>,
    pub collection_id: Option<Uuid>,
}

#[async_trait]
pub trait ProductRepository: Send {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Product>>;
    async fn list(&mut self, filter: &ProductFilter) -> RepoResult<(Vec<Product>, u64)>;
    async fn insert(&mut self, product: Product) -> RepoResult<Product>;
    async fn update(&mut self, id: Uuid, changes: ProductChanges) -> RepoResult<Product>;
    /// Also removes the product's cart items, reviews, tags and likes, and
    /// unsets it as a featured product. Order items must be gone already.
    async fn delete(&mut self, id: Uuid) -> RepoResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct CollectionChanges {
    pub title: Option<String>,
    pub featured_product_id: Option<Uuid>,
}

#[async_trait]
pub trait CollectionRepository: Send {
    /// Every collection ordered by title, with its product count.
    async fn list(&mut self) -> RepoResult<Vec<(Collection, u64)>>;
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Collection>>;
    async fn product_count(&mut self, id: Uuid) -> RepoResult<u64>;
    async fn insert(&mut self, collection: Collection) -> RepoResult<Collection>;
    async fn update(&mut self, id: Uuid, changes: CollectionChanges) -> RepoResult<Collection>;
    /// Fails with `Conflict` while products still belong to the collection.
    async fn delete(&mut self, id: Uuid) -> RepoResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait ReviewRepository: Send {
    /// Reviews of one product, oldest first.
    async fn for_product(&mut self, product_id: Uuid) -> RepoResult<Vec<Review>>;
    /// Only matches when the review belongs to `product_id`.
    async fn find(&mut self, product_id: Uuid, review_id: Uuid) -> RepoResult<Option<Review>>;
    async fn insert(&mut self, review: Review) -> RepoResult<Review>;
    async fn update(&mut self, id: Uuid, changes: ReviewChanges) -> RepoResult<Review>;
    async fn delete(&mut self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait CartRepository: Send {
    async fn insert(&mut self, cart: Cart) -> RepoResult<Cart>;
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Cart>>;
    /// Remove the cart together with its items. Returns whether it existed.
    async fn delete(&mut self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait CartItemRepository: Send {
    /// Items of a cart joined with their products. `for_update` asks the
    /// backend to lock the rows until the unit of work ends.
    async fn lines(&mut self, cart_id: Uuid, for_update: bool) -> RepoResult<Vec<CartLine>>;
    async fn find(&mut self, cart_id: Uuid, item_id: Uuid) -> RepoResult<Option<CartItem>>;
    async fn find_by_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> RepoResult<Option<CartItem>>;
    /// Fails with `Conflict` when `(cart_id, product_id)` is already present.
    async fn insert(&mut self, item: CartItem) -> RepoResult<CartItem>;
    async fn set_quantity(&mut self, item_id: Uuid, quantity: i32) -> RepoResult<CartItem>;
    async fn delete(&mut self, item_id: Uuid) -> RepoResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
    pub direction: SortDirection,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait OrderRepository: Send {
    async fn insert(&mut self, order: Order) -> RepoResult<Order>;
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Order>>;
    async fn list(&mut self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)>;
    async fn set_payment_status(&mut self, id: Uuid, status: PaymentStatus) -> RepoResult<Order>;
}

#[async_trait]
pub trait OrderItemRepository: Send {
    async fn insert_many(&mut self, items: Vec<OrderItem>) -> RepoResult<Vec<OrderItem>>;
    async fn for_order(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>>;
    async fn count_for_product(&mut self, product_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait TagRepository: Send {
    async fn find_or_create(&mut self, label: &str) -> RepoResult<Tag>;
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Tag>>;
    async fn tags_for(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<Vec<Tag>>;
    /// Idempotent: tagging an object twice returns the existing link.
    async fn attach(
        &mut self,
        tag_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<TaggedItem>;
    async fn detach(&mut self, tag_id: Uuid, kind: TaggedKind, object_id: Uuid)
    -> RepoResult<bool>;
}

#[async_trait]
pub trait LikeRepository: Send {
    /// Idempotent per `(user_id, kind, object_id)`.
    async fn like(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<LikedItem>;
    async fn unlike(&mut self, user_id: Uuid, kind: TaggedKind, object_id: Uuid)
    -> RepoResult<bool>;
    async fn count(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<u64>;
    async fn exists(&mut self, user_id: Uuid, kind: TaggedKind, object_id: Uuid)
    -> RepoResult<bool>;
}
