pub mod cart_items;
pub mod carts;
pub mod collections;
pub mod customers;
pub mod liked_items;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod tagged_items;
pub mod tags;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use collections::Entity as Collections;
pub use customers::Entity as Customers;
pub use liked_items::Entity as LikedItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use tagged_items::Entity as TaggedItems;
pub use tags::Entity as Tags;
