use apm_core::{
    models::{BidId, Identity, ImageId, ListingId, UserId},
    ports::{Application, MediaStore},
};
use apm_sqlite::Db;
use headers::{Authorization, authorization::Bearer};
use std::convert::Infallible;
use time::OffsetDateTime;
use uuid::Uuid;

/// Object-storage stand-in: URLs are derived under a fixed test host and
/// deletes always succeed.
#[derive(Clone)]
pub struct TestMedia;

impl MediaStore for TestMedia {
    type Error = Infallible;

    fn public_url(&self, key: &str) -> String {
        format!("https://media.test/{key}")
    }

    async fn delete_object(&self, _key: &str) -> Result<(), Infallible> {
        Ok(())
    }
}

// In order to test the endpoints without standing up a real identity
// provider, we encode the caller's identity claims as plain text in the
// `Authorization: Bearer <...>` header: `user_id|email|name`.
#[derive(Clone)]
pub struct TestApp {
    pub db: Db,
    media: TestMedia,
}

impl TestApp {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            media: TestMedia,
        }
    }
}

impl Application for TestApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Media = TestMedia;

    fn database(&self) -> &Db {
        &self.db
    }

    fn media(&self) -> &TestMedia {
        &self.media
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    async fn authenticate(&self, context: &Self::Context) -> Option<Identity> {
        let mut parts = context.0.token().splitn(3, '|');
        let user_id: UserId = parts.next()?.parse().ok()?;
        let email = parts.next()?.to_string();
        let name = parts
            .next()
            .filter(|name| !name.is_empty())
            .map(String::from);
        Some(Identity {
            user_id,
            email,
            name,
        })
    }

    fn generate_listing_id(&self) -> ListingId {
        ListingId(Uuid::new_v4())
    }

    fn generate_bid_id(&self) -> BidId {
        BidId(Uuid::new_v4())
    }

    fn generate_image_id(&self) -> ImageId {
        ImageId(Uuid::new_v4())
    }
}
