pub mod cart_service;
pub mod catalog_service;
pub mod collection_service;
pub mod customer_service;
pub mod like_service;
pub mod order_service;
pub mod review_service;
pub mod tag_service;
