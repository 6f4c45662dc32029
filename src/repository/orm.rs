//! PostgreSQL backend built on sea-orm. One unit of work is one database
//! transaction; dropping it without commit rolls the transaction back.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
    prelude::{DateTimeWithTimeZone, Decimal},
    sea_query::{Expr, LockType, extension::postgres::PgExpr},
};
use uuid::Uuid;

use super::{
    CartItemRepository, CartRepository, CollectionChanges, CollectionRepository, CustomerProfile,
    CustomerRepository, LikeRepository, OrderFilter, OrderItemRepository, OrderRepository,
    ProductChanges, ProductFilter, ProductRepository, ProductSort, RepoResult, ReviewChanges,
    ReviewRepository, SortDirection, Store, TagRepository, UnitOfWork,
};
use crate::{
    entity::{
        cart_items::{self, ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Entity as Carts},
        collections::{
            self, ActiveModel as CollectionActive, Column as CollectionCol, Entity as Collections,
        },
        customers::{ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers},
        liked_items::{ActiveModel as LikedActive, Column as LikedCol, Entity as LikedItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        reviews::{self, ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        tagged_items::{ActiveModel as TaggedActive, Column as TaggedCol, Entity as TaggedItems},
        tags::{self, ActiveModel as TagActive, Column as TagCol, Entity as Tags},
    },
    error::{RepositoryError, Resource},
    models::{
        Cart, CartItem, CartLine, Collection, Customer, LikedItem, Membership, Order, OrderItem,
        PaymentStatus, Product, Review, Tag, TaggedItem, TaggedKind,
    },
};

#[derive(Clone)]
pub struct OrmStore {
    conn: DatabaseConnection,
}

impl OrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Store for OrmStore {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let txn = self.conn.begin().await?;
        Ok(Box::new(OrmUnitOfWork { txn }))
    }
}

pub struct OrmUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for OrmUnitOfWork {
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
        self.txn.commit().await?;
        Ok(())
    }
}

fn small_quantity(quantity: i32) -> RepoResult<i16> {
    i16::try_from(quantity)
        .map_err(|_| RepositoryError::Fault(format!("quantity {quantity} out of range")))
}

fn parse_kind(kind: &str) -> RepoResult<TaggedKind> {
    kind.parse().map_err(RepositoryError::Fault)
}

/// `%text%` for ILIKE, with the pattern metacharacters of `text` escaped.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        title: model.title,
        slug: model.slug,
        description: model.description,
        unit_price: model.unit_price,
        inventory: model.inventory,
        last_update: model.last_update.with_timezone(&Utc),
        collection_id: model.collection_id,
    }
}

fn collection_from_entity(model: collections::Model) -> Collection {
    Collection {
        id: model.id,
        title: model.title,
        featured_product_id: model.featured_product_id,
    }
}

fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        name: model.name,
        description: model.description,
        date: model.date,
    }
}

fn customer_from_entity(model: crate::entity::customers::Model) -> RepoResult<Customer> {
    let membership = Membership::from_code(&model.membership).ok_or_else(|| {
        RepositoryError::Fault(format!("unknown membership code `{}`", model.membership))
    })?;
    Ok(Customer {
        id: model.id,
        user_id: model.user_id,
        phone: model.phone,
        birth_date: model.birth_date,
        membership,
    })
}

fn cart_item_from_entity(model: cart_items::Model) -> CartItem {
    CartItem {
        id: model.id,
        cart_id: model.cart_id,
        product_id: model.product_id,
        quantity: i32::from(model.quantity),
    }
}

fn order_from_entity(model: crate::entity::orders::Model) -> RepoResult<Order> {
    let payment_status = PaymentStatus::from_code(&model.payment_status).ok_or_else(|| {
        RepositoryError::Fault(format!(
            "unknown payment status `{}`",
            model.payment_status
        ))
    })?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        payment_status,
        placed_at: model.placed_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: crate::entity::order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: i32::from(model.quantity),
        unit_price: model.unit_price,
    }
}

fn tag_from_entity(model: tags::Model) -> Tag {
    Tag {
        id: model.id,
        label: model.label,
    }
}

#[async_trait]
impl CustomerRepository for OrmUnitOfWork {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Customer>> {
        Customers::find_by_id(id)
            .one(&self.txn)
            .await?
            .map(customer_from_entity)
            .transpose()
    }

    async fn find_by_user(&mut self, user_id: Uuid) -> RepoResult<Option<Customer>> {
        Customers::find()
            .filter(CustomerCol::UserId.eq(user_id))
            .one(&self.txn)
            .await?
            .map(customer_from_entity)
            .transpose()
    }

    async fn upsert(&mut self, user_id: Uuid, profile: CustomerProfile) -> RepoResult<Customer> {
        let existing = Customers::find()
            .filter(CustomerCol::UserId.eq(user_id))
            .one(&self.txn)
            .await?;

        let model = match existing {
            Some(model) => {
                let mut active: CustomerActive = model.into();
                active.phone = Set(profile.phone);
                active.birth_date = Set(profile.birth_date);
                active.membership = Set(profile.membership.code().to_string());
                active.update(&self.txn).await?
            }
            None => {
                CustomerActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    phone: Set(profile.phone),
                    birth_date: Set(profile.birth_date),
                    membership: Set(profile.membership.code().to_string()),
                }
                .insert(&self.txn)
                .await?
            }
        };
        customer_from_entity(model)
    }
}

#[async_trait]
impl ProductRepository for OrmUnitOfWork {
    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .one(&self.txn)
            .await?
            .map(product_from_entity))
    }

    async fn list(&mut self, filter: &ProductFilter) -> RepoResult<(Vec<Product>, u64)> {
        let mut condition = Condition::all();

        if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(search);
            condition = condition.add(
                Condition::any()
                    .add(Expr::col(ProdCol::Title).ilike(pattern.clone()))
                    .add(Expr::col(ProdCol::Description).ilike(pattern)),
            );
        }
        if let Some(collection_id) = filter.collection_id {
            condition = condition.add(ProdCol::CollectionId.eq(collection_id));
        }
        if let Some(min_price) = filter.price_above {
            condition = condition.add(ProdCol::UnitPrice.gt(min_price));
        }
        if let Some(max_price) = filter.price_below {
            condition = condition.add(ProdCol::UnitPrice.lt(max_price));
        }

        let sort_col = match filter.sort {
            ProductSort::Title => ProdCol::Title,
            ProductSort::UnitPrice => ProdCol::UnitPrice,
            ProductSort::LastUpdate => ProdCol::LastUpdate,
        };

        let mut finder = Products::find().filter(condition);
        finder = match filter.direction {
            SortDirection::Asc => finder.order_by_asc(sort_col).order_by_asc(ProdCol::Id),
            SortDirection::Desc => finder.order_by_desc(sort_col).order_by_desc(ProdCol::Id),
        };

        let total = finder.clone().count(&self.txn).await?;

        let items = finder
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.txn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();

        Ok((items, total))
    }

    async fn insert(&mut self, product: Product) -> RepoResult<Product> {
        let model = ProductActive {
            id: Set(product.id),
            title: Set(product.title),
            slug: Set(product.slug),
            description: Set(product.description),
            unit_price: Set(product.unit_price),
            inventory: Set(product.inventory),
            last_update: Set(product.last_update.into()),
            collection_id: Set(product.collection_id),
        }
        .insert(&self.txn)
        .await?;
        Ok(product_from_entity(model))
    }

    async fn update(&mut self, id: Uuid, changes: ProductChanges) -> RepoResult<Product> {
        let existing = Products::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or(RepositoryError::NotFound(Resource::Product))?;

        let mut active: ProductActive = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(slug) = changes.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(unit_price) = changes.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(inventory) = changes.inventory {
            active.inventory = Set(inventory);
        }
        if let Some(collection_id) = changes.collection_id {
            active.collection_id = Set(Some(collection_id));
        }
        active.last_update = Set(Utc::now().into());

        let model = active.update(&self.txn).await?;
        Ok(product_from_entity(model))
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<()> {
        // tags and likes have no foreign key; cart items and reviews
        // cascade and featured collections are set null by the schema
        TaggedItems::delete_many()
            .filter(TaggedCol::Kind.eq(TaggedKind::Product.as_str()))
            .filter(TaggedCol::ObjectId.eq(id))
            .exec(&self.txn)
            .await?;
        LikedItems::delete_many()
            .filter(LikedCol::Kind.eq(TaggedKind::Product.as_str()))
            .filter(LikedCol::ObjectId.eq(id))
            .exec(&self.txn)
            .await?;

        let result = Products::delete_by_id(id).exec(&self.txn).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(Resource::Product));
        }
        Ok(())
    }
}

#[derive(Debug, FromQueryResult)]
struct CollectionCountRow {
    id: Uuid,
    title: String,
    featured_product_id: Option<Uuid>,
    product_count: i64,
}

#[async_trait]
impl CollectionRepository for OrmUnitOfWork {
    async fn list(&mut self) -> RepoResult<Vec<(Collection, u64)>> {
        let rows = Collections::find()
            .select_only()
            .columns([
                CollectionCol::Id,
                CollectionCol::Title,
                CollectionCol::FeaturedProductId,
            ])
            .column_as(Expr::col((Products, ProdCol::Id)).count(), "product_count")
            .join(JoinType::LeftJoin, collections::Relation::Products.def())
            .group_by(CollectionCol::Id)
            .order_by_asc(CollectionCol::Title)
            .order_by_asc(CollectionCol::Id)
            .into_model::<CollectionCountRow>()
            .all(&self.txn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let collection = Collection {
                    id: row.id,
                    title: row.title,
                    featured_product_id: row.featured_product_id,
                };
                (collection, row.product_count.unsigned_abs())
            })
            .collect())
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Collection>> {
        Ok(Collections::find_by_id(id)
            .one(&self.txn)
            .await?
            .map(collection_from_entity))
    }

    async fn product_count(&mut self, id: Uuid) -> RepoResult<u64> {
        Ok(Products::find()
            .filter(ProdCol::CollectionId.eq(id))
            .count(&self.txn)
            .await?)
    }

    async fn insert(&mut self, collection: Collection) -> RepoResult<Collection> {
        let model = CollectionActive {
            id: Set(collection.id),
            title: Set(collection.title),
            featured_product_id: Set(collection.featured_product_id),
        }
        .insert(&self.txn)
        .await?;
        Ok(collection_from_entity(model))
    }

    async fn update(&mut self, id: Uuid, changes: CollectionChanges) -> RepoResult<Collection> {
        let existing = Collections::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or(RepositoryError::NotFound(Resource::Collection))?;

        let mut active: CollectionActive = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(featured) = changes.featured_product_id {
            active.featured_product_id = Set(Some(featured));
        }
        let model = active.update(&self.txn).await?;
        Ok(collection_from_entity(model))
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<()> {
        let result = Collections::delete_by_id(id).exec(&self.txn).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(Resource::Collection));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for OrmUnitOfWork {
    async fn for_product(&mut self, product_id: Uuid) -> RepoResult<Vec<Review>> {
        Ok(Reviews::find()
            .filter(ReviewCol::ProductId.eq(product_id))
            .order_by_asc(ReviewCol::Date)
            .order_by_asc(ReviewCol::Id)
            .all(&self.txn)
            .await?
            .into_iter()
            .map(review_from_entity)
            .collect())
    }

    async fn find(&mut self, product_id: Uuid, review_id: Uuid) -> RepoResult<Option<Review>> {
        Ok(Reviews::find_by_id(review_id)
            .filter(ReviewCol::ProductId.eq(product_id))
            .one(&self.txn)
            .await?
            .map(review_from_entity))
    }

    async fn insert(&mut self, review: Review) -> RepoResult<Review> {
        let model = ReviewActive {
            id: Set(review.id),
            product_id: Set(review.product_id),
            name: Set(review.name),
            description: Set(review.description),
            date: Set(review.date),
        }
        .insert(&self.txn)
        .await?;
        Ok(review_from_entity(model))
    }

    async fn update(&mut self, id: Uuid, changes: ReviewChanges) -> RepoResult<Review> {
        let existing = Reviews::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or(RepositoryError::NotFound(Resource::Review))?;

        let mut active: ReviewActive = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        let model = active.update(&self.txn).await?;
        Ok(review_from_entity(model))
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<bool> {
        let result = Reviews::delete_by_id(id).exec(&self.txn).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl CartRepository for OrmUnitOfWork {
    async fn insert(&mut self, cart: Cart) -> RepoResult<Cart> {
        let model = CartActive {
            id: Set(cart.id),
            created_at: Set(cart.created_at.into()),
        }
        .insert(&self.txn)
        .await?;
        Ok(Cart {
            id: model.id,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Cart>> {
        Ok(Carts::find_by_id(id).one(&self.txn).await?.map(|model| Cart {
            id: model.id,
            created_at: model.created_at.with_timezone(&Utc),
        }))
    }

    async fn delete(&mut self, id: Uuid) -> RepoResult<bool> {
        // the foreign key cascades too; deleting explicitly keeps the rows
        // count independent of how the schema was created
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(id))
            .exec(&self.txn)
            .await?;
        let result = Carts::delete_by_id(id).exec(&self.txn).await?;
        Ok(result.rows_affected > 0)
    }
}

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    id: Uuid,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i16,
    title: String,
    slug: String,
    description: Option<String>,
    unit_price: Decimal,
    inventory: i32,
    last_update: DateTimeWithTimeZone,
    collection_id: Option<Uuid>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            item: CartItem {
                id: row.id,
                cart_id: row.cart_id,
                product_id: row.product_id,
                quantity: i32::from(row.quantity),
            },
            product: Product {
                id: row.product_id,
                title: row.title,
                slug: row.slug,
                description: row.description,
                unit_price: row.unit_price,
                inventory: row.inventory,
                last_update: row.last_update.with_timezone(&Utc),
                collection_id: row.collection_id,
            },
        }
    }
}

#[async_trait]
impl CartItemRepository for OrmUnitOfWork {
    async fn lines(&mut self, cart_id: Uuid, for_update: bool) -> RepoResult<Vec<CartLine>> {
        let mut select = CartItems::find()
            .select_only()
            .columns([
                CartItemCol::Id,
                CartItemCol::CartId,
                CartItemCol::ProductId,
                CartItemCol::Quantity,
            ])
            .columns([
                ProdCol::Title,
                ProdCol::Slug,
                ProdCol::Description,
                ProdCol::UnitPrice,
                ProdCol::Inventory,
                ProdCol::LastUpdate,
                ProdCol::CollectionId,
            ])
            .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
            .filter(CartItemCol::CartId.eq(cart_id))
            .order_by_asc(ProdCol::Title)
            .order_by_asc(CartItemCol::Id);
        if for_update {
            select = select.lock(LockType::Update);
        }

        let rows = select.into_model::<CartLineRow>().all(&self.txn).await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    async fn find(&mut self, cart_id: Uuid, item_id: Uuid) -> RepoResult<Option<CartItem>> {
        Ok(CartItems::find()
            .filter(
                Condition::all()
                    .add(CartItemCol::CartId.eq(cart_id))
                    .add(CartItemCol::Id.eq(item_id)),
            )
            .one(&self.txn)
            .await?
            .map(cart_item_from_entity))
    }

    async fn find_by_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> RepoResult<Option<CartItem>> {
        Ok(CartItems::find()
            .filter(
                Condition::all()
                    .add(CartItemCol::CartId.eq(cart_id))
                    .add(CartItemCol::ProductId.eq(product_id)),
            )
            .one(&self.txn)
            .await?
            .map(cart_item_from_entity))
    }

    async fn insert(&mut self, item: CartItem) -> RepoResult<CartItem> {
        let model = CartItemActive {
            id: Set(item.id),
            cart_id: Set(item.cart_id),
            product_id: Set(item.product_id),
            quantity: Set(small_quantity(item.quantity)?),
        }
        .insert(&self.txn)
        .await?;
        Ok(cart_item_from_entity(model))
    }

    async fn set_quantity(&mut self, item_id: Uuid, quantity: i32) -> RepoResult<CartItem> {
        let existing = CartItems::find_by_id(item_id)
            .one(&self.txn)
            .await?
            .ok_or(RepositoryError::NotFound(Resource::CartItem))?;
        let mut active: CartItemActive = existing.into();
        active.quantity = Set(small_quantity(quantity)?);
        let model = active.update(&self.txn).await?;
        Ok(cart_item_from_entity(model))
    }

    async fn delete(&mut self, item_id: Uuid) -> RepoResult<bool> {
        let result = CartItems::delete_by_id(item_id).exec(&self.txn).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl OrderRepository for OrmUnitOfWork {
    async fn insert(&mut self, order: Order) -> RepoResult<Order> {
        let model = OrderActive {
            id: Set(order.id),
            customer_id: Set(order.customer_id),
            payment_status: Set(order.payment_status.code().to_string()),
            placed_at: Set(order.placed_at.into()),
        }
        .insert(&self.txn)
        .await?;
        order_from_entity(model)
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.txn)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn list(&mut self, filter: &OrderFilter) -> RepoResult<(Vec<Order>, u64)> {
        let mut condition = Condition::all();
        if let Some(customer_id) = filter.customer_id {
            condition = condition.add(OrderCol::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.payment_status {
            condition = condition.add(OrderCol::PaymentStatus.eq(status.code()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = match filter.direction {
            SortDirection::Asc => finder.order_by_asc(OrderCol::PlacedAt),
            SortDirection::Desc => finder.order_by_desc(OrderCol::PlacedAt),
        };

        let total = finder.clone().count(&self.txn).await?;

        let orders = finder
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.txn)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<RepoResult<Vec<_>>>()?;

        Ok((orders, total))
    }

    async fn set_payment_status(&mut self, id: Uuid, status: PaymentStatus) -> RepoResult<Order> {
        let existing = Orders::find_by_id(id)
            .lock(LockType::Update)
            .one(&self.txn)
            .await?
            .ok_or(RepositoryError::NotFound(Resource::Order))?;
        let mut active: OrderActive = existing.into();
        active.payment_status = Set(status.code().to_string());
        let model = active.update(&self.txn).await?;
        order_from_entity(model)
    }
}

#[async_trait]
impl OrderItemRepository for OrmUnitOfWork {
    async fn insert_many(&mut self, items: Vec<OrderItem>) -> RepoResult<Vec<OrderItem>> {
        if items.is_empty() {
            return Ok(items);
        }

        let mut rows = Vec::with_capacity(items.len());
        for item in &items {
            rows.push(OrderItemActive {
                id: Set(item.id),
                order_id: Set(item.order_id),
                product_id: Set(item.product_id),
                quantity: Set(small_quantity(item.quantity)?),
                unit_price: Set(item.unit_price),
            });
        }
        OrderItems::insert_many(rows).exec(&self.txn).await?;
        Ok(items)
    }

    async fn for_order(&mut self, order_id: Uuid) -> RepoResult<Vec<OrderItem>> {
        Ok(OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::Id)
            .all(&self.txn)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect())
    }

    async fn count_for_product(&mut self, product_id: Uuid) -> RepoResult<u64> {
        Ok(OrderItems::find()
            .filter(OrderItemCol::ProductId.eq(product_id))
            .count(&self.txn)
            .await?)
    }
}

#[async_trait]
impl TagRepository for OrmUnitOfWork {
    async fn find_or_create(&mut self, label: &str) -> RepoResult<Tag> {
        if let Some(model) = Tags::find()
            .filter(TagCol::Label.eq(label))
            .one(&self.txn)
            .await?
        {
            return Ok(tag_from_entity(model));
        }
        let model = TagActive {
            id: Set(Uuid::new_v4()),
            label: Set(label.to_string()),
        }
        .insert(&self.txn)
        .await?;
        Ok(tag_from_entity(model))
    }

    async fn find(&mut self, id: Uuid) -> RepoResult<Option<Tag>> {
        Ok(Tags::find_by_id(id)
            .one(&self.txn)
            .await?
            .map(tag_from_entity))
    }

    async fn tags_for(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<Vec<Tag>> {
        Ok(Tags::find()
            .join(JoinType::InnerJoin, tags::Relation::TaggedItems.def())
            .filter(
                Condition::all()
                    .add(TaggedCol::Kind.eq(kind.as_str()))
                    .add(TaggedCol::ObjectId.eq(object_id)),
            )
            .order_by_asc(TagCol::Label)
            .all(&self.txn)
            .await?
            .into_iter()
            .map(tag_from_entity)
            .collect())
    }

    async fn attach(
        &mut self,
        tag_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<TaggedItem> {
        let existing = TaggedItems::find()
            .filter(
                Condition::all()
                    .add(TaggedCol::TagId.eq(tag_id))
                    .add(TaggedCol::Kind.eq(kind.as_str()))
                    .add(TaggedCol::ObjectId.eq(object_id)),
            )
            .one(&self.txn)
            .await?;

        let model = match existing {
            Some(model) => model,
            None => {
                TaggedActive {
                    id: Set(Uuid::new_v4()),
                    tag_id: Set(tag_id),
                    kind: Set(kind.as_str().to_string()),
                    object_id: Set(object_id),
                }
                .insert(&self.txn)
                .await?
            }
        };

        Ok(TaggedItem {
            id: model.id,
            tag_id: model.tag_id,
            kind: parse_kind(&model.kind)?,
            object_id: model.object_id,
        })
    }

    async fn detach(
        &mut self,
        tag_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        let result = TaggedItems::delete_many()
            .filter(
                Condition::all()
                    .add(TaggedCol::TagId.eq(tag_id))
                    .add(TaggedCol::Kind.eq(kind.as_str()))
                    .add(TaggedCol::ObjectId.eq(object_id)),
            )
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

fn like_condition(user_id: Uuid, kind: TaggedKind, object_id: Uuid) -> Condition {
    Condition::all()
        .add(LikedCol::UserId.eq(user_id))
        .add(LikedCol::Kind.eq(kind.as_str()))
        .add(LikedCol::ObjectId.eq(object_id))
}

#[async_trait]
impl LikeRepository for OrmUnitOfWork {
    async fn like(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<LikedItem> {
        let existing = LikedItems::find()
            .filter(like_condition(user_id, kind, object_id))
            .one(&self.txn)
            .await?;

        let model = match existing {
            Some(model) => model,
            None => {
                LikedActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    kind: Set(kind.as_str().to_string()),
                    object_id: Set(object_id),
                }
                .insert(&self.txn)
                .await?
            }
        };

        Ok(LikedItem {
            id: model.id,
            user_id: model.user_id,
            kind: parse_kind(&model.kind)?,
            object_id: model.object_id,
        })
    }

    async fn unlike(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        let result = LikedItems::delete_many()
            .filter(like_condition(user_id, kind, object_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn count(&mut self, kind: TaggedKind, object_id: Uuid) -> RepoResult<u64> {
        Ok(LikedItems::find()
            .filter(
                Condition::all()
                    .add(LikedCol::Kind.eq(kind.as_str()))
                    .add(LikedCol::ObjectId.eq(object_id)),
            )
            .count(&self.txn)
            .await?)
    }

    async fn exists(
        &mut self,
        user_id: Uuid,
        kind: TaggedKind,
        object_id: Uuid,
    ) -> RepoResult<bool> {
        let count = LikedItems::find()
            .filter(like_condition(user_id, kind, object_id))
            .count(&self.txn)
            .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mug"), "%mug%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}
