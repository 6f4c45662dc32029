//! In-process backend. Units of work are serialized behind one async mutex and
//! operate on a private copy of the tables that replaces the shared copy on
//! commit.

use std::{cmp::Ordering, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    CartItemRepository, CartRepository, CollectionChanges, CollectionRepository, CustomerProfile,
    CustomerRepository, LikeRepository, OrderFilter, OrderItemRepository, OrderRepository,
    ProductChanges, ProductFilter, ProductRepository, ProductSort, RepoResult, ReviewChanges,
    ReviewRepository, SortDirection, Store, TagRepository, UnitOfWork,
};
use crate::{
    error::{RepositoryError, Resource},
    models::{
        Cart, CartItem, CartLine, Collection, Customer, LikedItem, Order, OrderItem,
        PaymentStatus, Product, Review, Tag, TaggedItem, TaggedKind,
    },
};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: Vec<Product>,
    collections: Vec<Collection>,
    reviews: Vec<Review>,
    customers: Vec<Customer>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    tags: Vec<Tag>,
    tagged_items: Vec<TaggedItem>,
    liked_items: Vec<LikedItem>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn customers(&mut self) -> &mut dyn CustomerRepository {
        self
    }

    fn products(&mut self) -> &mut dyn ProductRepository {
        self
    }

    fn collections(&mut self) -> &mut dyn CollectionRepository {
        self
    }

    fn reviews(&mut self) -> &mut dyn ReviewRepository {
        self
    }

    fn carts(&mut self) -> &mut dyn CartRepository {
        self
    }

    fn cart_items(&mut self) -> &mut dyn CartItemRepository {
        self
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        self
    }

    fn order_items(&mut self) -> &mut dyn OrderItemRepository {
        self
    }

    fn tags(&mut self) -> &mut dyn TagRepository {
        self
    }

    fn likes(&mut self) -> &mut dyn LikeRepository {
        self
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

impl MemoryUnitOfWork {
    fn ensure_collection(&self, id: Option<Uuid>) -> RepoResult<()> {
        match id {
            Some(id) if !self.staged.collections.iter().any(|c| c.id == id) => Err(
                RepositoryError::Conflict(format!("collection {id} does not exist")),
            ),
            _ => Ok(()),
        }
    }

    fn ensure_product(&self, id: Option<Uuid>) -> RepoResult<()> {
        match id {
            Some(id) if !self.staged.products.iter().any(|p| p.id == id) => Err(
                RepositoryError::Conflict(format!("product {id} does not exist")),
            ),
            _ => Ok(()),
        }
    }
}

fn page<T>(rows: Vec<T>, limit: u64, offset: u64) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

#[async_trait]
impl CustomerRepository for MemoryUnitOfWork {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Customer>> {
        Ok(self.staged.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_user(&mut self, user_id: Uuid) -> RepoResult<Option<Customer>> {
        Ok(self
            .staged
            .customers
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn upsert(&mut self, user_id: Uuid, profile: CustomerProfile) -> RepoResult<Customer> {
        if let Some(existing) = self
            .staged
            .customers
            .iter_mut()
            .find(|c| c.user_id == user_id)
        {
            existing.phone = profile.phone;
            existing.birth_date = profile.birth_date;
            existing.membership = profile.membership;
            return Ok(existing.clone());
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            user_id,
            phone: profile.phone,
            birth_date: profile.birth_date,
            membership: profile.membership,
        };
        self.staged.customers.push(customer.clone());
        Ok(customer)
    }
}

#[async_trait]
impl ProductRepository for MemoryUnitOfWork {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.staged.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&mut self, filter: &ProductFilter) -> RepoResult<(Vec<Product>, u64)> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<Product> = self
            .staged
            .products
            .iter()
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    p.title.to_lowercase().contains(n)
                        || p
                            .description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(n))
                })
            })
            .filter(|p| filter.collection_id.is_none_or(|c| p.collection_id == Some(c)))
            .filter(|p| filter.price_above.is_none_or(|min| p.unit_price > min))
            .filter(|p| filter.price_below.is_none_or(|max| p.unit_price < max))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match filter.sort {
                ProductSort::Title => a.title.cmp(&b.title),
                ProductSort::UnitPrice => a.unit_price.cmp(&b.unit_price),
                ProductSort::LastUpdate => a.last_update.cmp(&b.last_update),
            };
            directed(ordering, filter.direction)
        });

        let total = rows.len() as u64;
        Ok((page(rows, filter.limit, filter.offset), total))
    }

    async fn insert(&mut self, product: Product) -> RepoResult<Product> {
        if self.staged.products.iter().any(|p| p.id == product.id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        self.ensure_collection(product.collection_id)?;
        self.staged.products.push(product.clone());
        Ok(product)
    }

    async fn update(&mut self, id: Uuid, changes: ProductChanges) -> RepoResult<Product> {
        self.ensure_collection(changes.collection_id)?;
        let product = self
            .staged
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound(Resource::Product))?;

        if let Some(title) = changes.title {
            product.title = title;
        }
        if let Some(slug) = changes.slug {
            product.slug = slug;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(unit_price) = changes.unit_price {
            product.unit_price = unit_price;
        }
        if let Some(inventory) = changes.inventory {
            product.inventory = inventory;
        }
        if let Some(collection_id) = changes.collection_id {
            product.collection_id = Some(collection_id);
        }
        product.last_update = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<()> {
        if !self.staged.products.iter().any(|p| p.id == id) {
            return Err(RepositoryError::NotFound(Resource::Product));
        }
        if self.staged.order_items.iter().any(|i| i.product_id == id) {
            return Err(RepositoryError::Conflict(format!(
                "product {id} is referenced by order items"
            )));
        }
        self.staged.cart_items.retain(|i| i.product_id != id);
        self.staged.reviews.retain(|r| r.product_id != id);
        self.staged
            .tagged_items
            .retain(|t| !(t.kind == TaggedKind::Product && t.object_id == id));
        self.staged
            .liked_items
            .retain(|l| !(l.kind == TaggedKind::Product && l.object_id == id));
        for collection in &mut self.staged.collections {
            if collection.featured_product_id == Some(id) {
                collection.featured_product_id = None;
            }
        }
        self.staged.products.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl CollectionRepository for MemoryUnitOfWork {
    async fn list(&mut self) -> RepoResult<Vec<(Collection, u64)>> {
        let mut rows: Vec<(Collection, u64)> = self
            .staged
            .collections
            .iter()
            .map(|c| {
                let count = self
                    .staged
                    .products
                    .iter()
                    .filter(|p| p.collection_id == Some(c.id))
                    .count() as u64;
                (c.clone(), count)
            })
            .collect();
        rows.sort_by(|(a, _), (b, _)| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Collection>> {
        Ok(self.staged.collections.iter().find(|c| c.id == id).cloned())
    }

    async fn product_count(&mut self, id: Uuid) -> RepoResult<u64> {
        Ok(self
            .staged
            .products
            .iter()
            .filter(|p| p.collection_id == Some(id))
            .count() as u64)
    }

    async fn insert(&mut self, collection: Collection) -> RepoResult<Collection> {
        if self.staged.collections.iter().any(|c| c.id == collection.id) {
            return Err(RepositoryError::Conflict(format!(
                "collection {} already exists",
                collection.id
            )));
        }
        self.ensure_product(collection.featured_product_id)?;
        self.staged.collections.push(collection.clone());
        Ok(collection)
    }

    async fn update(&mut self, id: Uuid, changes: CollectionChanges) -> RepoResult<Collection> {
        self.ensure_product(changes.featured_product_id)?;
        let collection = self
            .staged
            .collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound(Resource::Collection))?;
        if let Some(title) = changes.title {
            collection.title = title;
        }
        if let Some(featured) = changes.featured_product_id {
            collection.featured_product_id = Some(featured);
        }
        Ok(collection.clone())
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<()> {
        if !self.staged.collections.iter().any(|c| c.id == id) {
            return Err(RepositoryError::NotFound(Resource::Collection));
        }
        if self.staged.products.iter().any(|p| p.collection_id == Some(id)) {
            return Err(RepositoryError::Conflict(format!(
                "collection {id} still has products"
            )));
        }
        self.staged.collections.retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for MemoryUnitOfWork {
    async fn for_product(&mut self, product_id: Uuid) -> RepoResult<Vec<Review>> {
        let mut rows: Vec<Review> = self
            .staged
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find(&mut self, product_id: Uuid, review_id: Uuid) -> RepoResult<Option<Review>> {
        Ok(self
            .staged
            .reviews
            .iter()
            .find(|r| r.product_id == product_id && r.id == review_id)
            .cloned())
    }

    async fn insert(&mut self, review: Review) -> RepoResult<Review> {
        self.ensure_product(Some(review.product_id))?;
        self.staged.reviews.push(review.clone());
        Ok(review)
    }

    async fn update(&mut self, id: Uuid, changes: ReviewChanges) -> RepoResult<Review> {
        let review = self
            .staged
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepositoryError::NotFound(Resource::Review))?;
        if let Some(name) = changes.name {
            review.name = name;
        }
        if let Some(description) = changes.description {
            review.description = description;
        }
        Ok(review.clone())
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<bool> {
        let before = self.staged.reviews.len();
        self.staged.reviews.retain(|r| r.id != id);
        Ok(self.staged.reviews.len() != before)
    }
}

#[async_trait]
impl CartRepository for MemoryUnitOfWork {
    async fn insert(&mut self, cart: Cart) -> RepoResult<Cart> {
        if self.staged.carts.iter().any(|c| c.id == cart.id) {
            return Err(RepositoryError::Conflict(format!(
                "cart {} already exists",
                cart.id
            )));
        }
        self.staged.carts.push(cart.clone());
        Ok(cart)
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Cart>> {
        Ok(self.staged.carts.iter().find(|c| c.id == id).cloned())
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<bool> {
        let before = self.staged.carts.len();
        self.staged.carts.retain(|c| c.id != id);
        let existed = self.staged.carts.len() != before;
        if existed {
            self.staged.cart_items.retain(|i| i.cart_id != id);
        }
        Ok(existed)
    }
}

#[async_trait]
impl CartItemRepository for MemoryUnitOfWork {
    async fn lines(&mut self, cart_id: Uuid, _for_update: bool) -> RepoResult<Vec<CartLine>> {
        let mut lines = Vec::new();
        for item in self.staged.cart_items.iter().filter(|i| i.cart_id == cart_id) {
            let product = self
                .staged
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .cloned()
                .ok_or_else(|| {
                    RepositoryError::Fault(format!(
                        "cart item {} points at missing product {}",
                        item.id, item.product_id
                    ))
                })?;
            lines.push(CartLine {
                item: item.clone(),
                product,
            });
        }
        lines.sort_by(|a, b| {
            a.product
                .title
                .cmp(&b.product.title)
                .then(a.item.id.cmp(&b.item.id))
        });
        Ok(lines)
    }

    async fn find(&mut self, cart_id: Uuid, item_id: Uuid) -> RepoResult<Option<CartItem>> {
        Ok(self
            .staged
            .cart_items
            .iter()
            .find(|i| i.cart_id == cart_id && i.id == item_id)
            .cloned())
    }

    async fn find_by_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> RepoResult<Option<CartItem>> {
        Ok(self
            .staged
            .cart_items
            .iter()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id)
            .cloned())
    }

    async fn insert(&mut self, item: CartItem) -> RepoResult<CartItem> {
        if !self.staged.carts.iter().any(|c| c.id == item.cart_id) {
            return Err(RepositoryError::Conflict(format!(
                "cart {} does not exist",
                item.cart_id
            )));
        }
        if !self.staged.products.iter().any(|p| p.id == item.product_id) {
            return Err(RepositoryError::Conflict(format!(
                "product {} does not exist",
                item.product_id
            )));
        }
        if self
            .staged
            .cart_items
            .iter()
            .any(|i| i.cart_id == item.cart_id && i.product_id == item.product_id)
        {
            return Err(RepositoryError::Conflict("unique_cart_product".to_string()));
        }
        self.staged.cart_items.push(item.clone());
        Ok(item)
    }

    async fn set_quantity(&mut self, item_id: Uuid, quantity: i32) -> RepoResult<CartItem> {
        let item = self
            .staged
            .cart_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(RepositoryError::NotFound(Resource::CartItem))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn delete(&mut self, item_id: Uuid) -> RepoResult<bool> {
        let before = self.staged.cart_items.len();
        self.staged.cart_items.retain(|i| i.id != item_id);
        Ok(self.staged.cart_items.len() != before)
    }
}

#[async_trait]
impl OrderRepository for MemoryUnitOfWork {
    async fn insert(&mut self, order: Order) -> RepoResult<Order> {
        if !self.staged.customers.iter().any(|c| c.id == order.customer_id) {
            return Err(RepositoryError::Conflict(format!(
                "customer {} does not exist",
                order.customer_id
            )));
        }
        self.staged.orders.push(order.clone());
        Ok(order)
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.staged.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list(&mut self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)> {
        let mut rows: Vec<Order> = self
            .staged
            .orders
            .iter()
            .filter(|o| filter.customer_id.is_none_or(|c| o.customer_id == c))
            .filter(|o| filter.payment_status.is_none_or(|s| o.payment_status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| directed(a.placed_at.cmp(&b.placed_at), filter.direction));

        let total = rows.len() as u64;
        Ok((page(rows, filter.limit, filter.offset), total))
    }

    async fn set_payment_status(&mut self, id: Uuid, status: PaymentStatus) -> RepoResult<Order> {
        let order = self
            .staged
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound(Resource::Order))?;
        order.payment_status = status;
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderItemRepository for MemoryUnitOfWork {
    async fn insert_many(&mut self, items: Vec<OrderItem>) -> RepoResult<Vec<OrderItem>> {
        for item in &items {
            if !self.staged.orders.iter().any(|o| o.id == item.order_id) {
                return Err(RepositoryError::Conflict(format!(
                    "order {} does not exist",
                    item.order_id
                )));
            }
            if !self.staged.products.iter().any(|p| p.id == item.product_id) {
                return Err(RepositoryError::Conflict(format!(
                    "product {} does not exist",
                    item.product_id
                )));
            }
        }
        self.staged.order_items.extend(items.iter().cloned());
        Ok(items)
    }

    async fn for_order(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>> {
        Ok(self
            .staged
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn count_for_product(&mut self, product_id: Uuid) -> RepoResult<u64> {
        Ok(self
            .staged
            .order_items
            .iter()
            .filter(|i| i.product_id == product_id)
            .count() as u64)
    }
}

#[async_trait]
impl TagRepository for MemoryUnitOfWork {
    async fn find_or_create(&mut self, label: &str) -> RepoResult<Tag> {
        if let Some(tag) = self.staged.tags.iter().find(|t| t.label == label) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            label: label.to_string(),
        };
        self.staged.tags.push(tag.clone());
        Ok(tag)
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Tag>> {
        Ok(self.staged.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn tags_for(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .staged
            .tagged_items
            .iter()
            .filter(|t| t.kind == kind && t.object_id == object_id)
            .filter_map(|t| self.staged.tags.iter().find(|tag| tag.id == t.tag_id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(tags)
    }

    async fn attach(
        &mut self,
        tag_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<TaggedItem> {
        if let Some(existing) = self
            .staged
            .tagged_items
            .iter()
            .find(|t| t.tag_id == tag_id && t.kind == kind && t.object_id == object_id)
        {
            return Ok(existing.clone());
        }
        if !self.staged.tags.iter().any(|t| t.id == tag_id) {
            return Err(RepositoryError::NotFound(Resource::Tag));
        }
        let tagged = TaggedItem {
            id: Uuid::new_v4(),
            tag_id,
            kind,
            object_id,
        };
        self.staged.tagged_items.push(tagged.clone());
        Ok(tagged)
    }

    async fn detach(
        &mut self,
        tag_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        let before = self.staged.tagged_items.len();
        self.staged
            .tagged_items
            .retain(|t| !(t.tag_id == tag_id && t.kind == kind && t.object_id == object_id));
        Ok(self.staged.tagged_items.len() != before)
    }
}

#[async_trait]
impl LikeRepository for MemoryUnitOfWork {
    async fn like(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<LikedItem> {
        if let Some(existing) = self
            .staged
            .liked_items
            .iter()
            .find(|l| l.user_id == user_id && l.kind == kind && l.object_id == object_id)
        {
            return Ok(existing.clone());
        }
        let liked = LikedItem {
            id: Uuid::new_v4(),
            user_id,
            kind,
            object_id,
        };
        self.staged.liked_items.push(liked.clone());
        Ok(liked)
    }

    async fn unlike(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        let before = self.staged.liked_items.len();
        self.staged
            .liked_items
            .retain(|l| !(l.user_id == user_id && l.kind == kind && l.object_id == object_id));
        Ok(self.staged.liked_items.len() != before)
    }

    async fn count(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<u64> {
        Ok(self
            .staged
            .liked_items
            .iter()
            .filter(|l| l.kind == kind && l.object_id == object_id)
            .count() as u64)
    }

    async fn exists(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        Ok(self
            .staged
            .liked_items
            .iter()
            .any(|l| l.user_id == user_id && l.kind == kind && l.object_id == object_id))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(title: &str, cents: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: title.to_lowercase(),
            description: None,
            unit_price: Decimal::new(cents, 2),
            inventory: 10,
            last_update: Utc::now(),
            collection_id: None,
        }
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_changes() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.products().insert(product("Mug", 1200)).await.unwrap();
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        let (rows, total) = uow
            .products()
            .list(&ProductFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn committed_changes_are_visible_to_the_next_unit_of_work() {
        let store = MemoryStore::new();
        let mug = product("Mug", 1200);

        let mut uow = store.begin().await.unwrap();
        uow.products().insert(mug.clone()).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.products().find(mug.id).await.unwrap(), Some(mug));
    }

    #[tokio::test]
    async fn duplicate_cart_product_is_a_conflict() {
        let store = MemoryStore::new();
        let mug = product("Mug", 1200);
        let cart = Cart {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let mut uow = store.begin().await.unwrap();
        uow.products().insert(mug.clone()).await.unwrap();
        uow.carts().insert(cart.clone()).await.unwrap();
        let item = CartItem {
            id: Uuid::new_v4(),
            cart_id: cart.id,
            product_id: mug.id,
            quantity: 1,
        };
        uow.cart_items().insert(item).await.unwrap();

        let duplicate = CartItem {
            id: Uuid::new_v4(),
            cart_id: cart.id,
            product_id: mug.id,
            quantity: 2,
        };
        let err = uow.cart_items().insert(duplicate).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_cart_cascades_to_its_items() {
        let store = MemoryStore::new();
        let mug = product("Mug", 1200);
        let cart = Cart {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let mut uow = store.begin().await.unwrap();
        uow.products().insert(mug.clone()).await.unwrap();
        uow.carts().insert(cart.clone()).await.unwrap();
        uow.cart_items()
            .insert(CartItem {
                id: Uuid::new_v4(),
                cart_id: cart.id,
                product_id: mug.id,
                quantity: 1,
            })
            .await
            .unwrap();

        assert!(uow.carts().delete(cart.id).await.unwrap());
        assert!(uow.cart_items().lines(cart.id, false).await.unwrap().is_empty());
        assert!(!uow.carts().delete(cart.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_product_clears_everything_pointing_at_it() {
        let store = MemoryStore::new();
        let mug = product("Mug", 1200);
        let user_id = Uuid::new_v4();

        let mut uow = store.begin().await.unwrap();
        uow.products().insert(mug.clone()).await.unwrap();
        let tag = uow.tags().find_or_create("kitchen").await.unwrap();
        uow.tags()
            .attach(tag.id, TaggedKind::Product, mug.id)
            .await
            .unwrap();
        uow.likes()
            .like(user_id, TaggedKind::Product, mug.id)
            .await
            .unwrap();
        uow.reviews()
            .insert(Review {
                id: Uuid::new_v4(),
                product_id: mug.id,
                name: "Ana".into(),
                description: "Holds coffee".into(),
                date: Utc::now().date_naive(),
            })
            .await
            .unwrap();
        let featured = uow
            .collections()
            .insert(Collection {
                id: Uuid::new_v4(),
                title: "Kitchen".into(),
                featured_product_id: Some(mug.id),
            })
            .await
            .unwrap();

        uow.products().delete(mug.id).await.unwrap();

        assert!(
            uow.tags()
                .tags_for(TaggedKind::Product, mug.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(uow.likes().count(TaggedKind::Product, mug.id).await.unwrap(), 0);
        assert!(uow.reviews().for_product(mug.id).await.unwrap().is_empty());
        let featured = uow.collections().find(featured.id).await.unwrap().unwrap();
        assert_eq!(featured.featured_product_id, None);
    }

    #[tokio::test]
    async fn collection_with_products_cannot_be_deleted() {
        let store = MemoryStore::new();
        let kitchen = Collection {
            id: Uuid::new_v4(),
            title: "Kitchen".into(),
            featured_product_id: None,
        };
        let mut uow = store.begin().await.unwrap();
        uow.collections().insert(kitchen.clone()).await.unwrap();
        let mug = Product {
            collection_id: Some(kitchen.id),
            ..product("Mug", 1200)
        };
        uow.products().insert(mug).await.unwrap();

        let err = uow.collections().delete(kitchen.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let listed = uow.collections().list().await.unwrap();
        assert_eq!(listed, vec![(kitchen, 1)]);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.products().insert(product("Mug", 1200)).await.unwrap();
        uow.products()
            .insert(product("100% Cotton Towel", 900))
            .await
            .unwrap();

        let (rows, total) = uow
            .products()
            .list(&ProductFilter {
                search: Some("%".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "100% Cotton Towel");
    }
}
