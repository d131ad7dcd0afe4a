#![allow(dead_code)]

use apm_core::models::{Identity, ListingData, ListingRecord, UserId};
use apm_core::ports::{ListingRepository as _, UserRepository as _};
use apm_sqlite::{Db, config::SqliteConfig};
use time::OffsetDateTime;

pub async fn open_db() -> Db {
    Db::open(&SqliteConfig::default())
        .await
        .expect("in-memory database should open")
}

pub fn identity(name: &str) -> Identity {
    Identity {
        user_id: UserId(uuid::Uuid::new_v4()),
        email: format!("{name}@example.com"),
        name: Some(name.to_string()),
    }
}

pub fn part(title: &str, end_date: OffsetDateTime) -> ListingData {
    ListingData {
        title: title.to_string(),
        description: "A part in good working order".to_string(),
        category: "engine".to_string(),
        make: Some("Volvo".to_string()),
        model: Some("240".to_string()),
        year: Some(1992),
        condition: "used".to_string(),
        location: "Gothenburg".to_string(),
        end_date,
    }
}

/// Create a seller and a listing in one go.
pub async fn seed_listing(
    db: &Db,
    seller: &Identity,
    data: ListingData,
    price: f64,
    as_of: OffsetDateTime,
) -> ListingRecord {
    db.ensure_user(seller, as_of).await.unwrap();
    db.create_listing(
        apm_core::models::ListingId(uuid::Uuid::new_v4()),
        seller.user_id,
        data,
        price,
        as_of,
    )
    .await
    .unwrap()
}

pub fn bid_id() -> apm_core::models::BidId {
    apm_core::models::BidId(uuid::Uuid::new_v4())
}

pub fn image_id() -> apm_core::models::ImageId {
    apm_core::models::ImageId(uuid::Uuid::new_v4())
}
