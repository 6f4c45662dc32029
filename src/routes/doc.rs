use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddCartItemRequest, CartDto, CartItemDto, CartItemList, ProductSummary, UpdateCartItemRequest},
        collections::{CollectionDto, CollectionList, CollectionRequest, UpdateCollectionRequest},
        customers::CustomerProfileRequest,
        orders::{CreateOrderRequest, OrderDto, OrderItemDto, OrderList, UpdateOrderRequest},
        products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest},
        reviews::{ReviewList, ReviewRequest, UpdateReviewRequest},
        tags::{AddTagRequest, LikeSummary, TagList},
    },
    middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER},
    models::{Collection, Customer, Membership, PaymentStatus, Review, Tag, TaggedKind},
    response::{ApiResponse, Meta},
    routes::{carts, collections, customers, health, likes, orders, params, products, reviews, tags},
};

struct CallerHeaders;

impl Modify for CallerHeaders {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "user_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
        );
        components.add_security_scheme(
            "user_role",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ROLE_HEADER))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        carts::create_cart,
        carts::get_cart,
        carts::delete_cart,
        carts::list_items,
        carts::add_item,
        carts::get_item,
        carts::update_item,
        carts::remove_item,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        reviews::list_reviews,
        reviews::create_review,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        collections::list_collections,
        collections::get_collection,
        collections::create_collection,
        collections::update_collection,
        collections::delete_collection,
        customers::get_me,
        customers::put_me,
        tags::list_tags,
        tags::add_tag,
        tags::remove_tag,
        likes::get_likes,
        likes::like,
        likes::unlike
    ),
    components(
        schemas(
            AddCartItemRequest,
            UpdateCartItemRequest,
            ProductSummary,
            CartItemDto,
            CartDto,
            CartItemList,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderItemDto,
            OrderDto,
            OrderList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductDto,
            ProductList,
            Collection,
            CollectionRequest,
            UpdateCollectionRequest,
            CollectionDto,
            CollectionList,
            Review,
            ReviewRequest,
            UpdateReviewRequest,
            ReviewList,
            CustomerProfileRequest,
            Customer,
            Membership,
            PaymentStatus,
            Tag,
            TaggedKind,
            AddTagRequest,
            TagList,
            LikeSummary,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<CartDto>,
            ApiResponse<OrderDto>,
            ApiResponse<OrderList>,
            ApiResponse<ProductDto>,
            ApiResponse<ProductList>,
            ApiResponse<CollectionDto>,
            ApiResponse<CollectionList>,
            ApiResponse<Review>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("user_id" = []),
        ("user_role" = [])
    ),
    modifiers(&CallerHeaders),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Carts", description = "Anonymous carts and their items"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Products", description = "Product catalog"),
        (name = "Collections", description = "Product collections"),
        (name = "Reviews", description = "Reviews nested under a product"),
        (name = "Customers", description = "Customer profile of the caller"),
        (name = "Tags", description = "Tags on products, orders and customers"),
        (name = "Likes", description = "Likes on products, orders and customers"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
