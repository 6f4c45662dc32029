use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    models::{Membership, Product},
    repository::{CustomerProfile, OrmStore, ProductFilter, Store},
    services::catalog_service::slugify,
};
use uuid::Uuid;

/// Fixed identity for the demo shopper, usable as `x-user-id`.
const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(config.require_database_url()?).await?;
    run_migrations(&orm).await?;
    let store = OrmStore::new(orm);

    let mut uow = store.begin().await?;

    let filter = ProductFilter {
        limit: 1000,
        ..ProductFilter::default()
    };
    let (existing, _) = uow.products().list(&filter).await?;
    let existing: HashSet<String> = existing.into_iter().map(|p| p.slug).collect();

    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", Decimal::new(5500, 2), 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", Decimal::new(1200, 2), 100),
        ("Rust Sticker Pack", "Decorate your laptop", Decimal::new(500, 2), 200),
        ("E-book: Async Rust", "Learn async Rust patterns", Decimal::new(2500, 2), 75),
    ];
    let mut inserted = 0;
    for (title, description, unit_price, inventory) in products {
        let slug = slugify(title);
        if existing.contains(&slug) {
            continue;
        }
        uow.products()
            .insert(Product {
                id: Uuid::new_v4(),
                title: title.to_string(),
                slug,
                description: Some(description.to_string()),
                unit_price,
                inventory,
                last_update: Utc::now(),
                collection_id: None,
            })
            .await?;
        inserted += 1;
    }

    let customer = uow
        .customers()
        .upsert(
            DEMO_USER_ID,
            CustomerProfile {
                phone: "+1 555 0100".to_string(),
                birth_date: None,
                membership: Membership::Silver,
            },
        )
        .await?;

    uow.commit().await?;

    println!("Seeded {inserted} products");
    println!("Demo customer {} for x-user-id {DEMO_USER_ID}", customer.id);
    Ok(())
}
