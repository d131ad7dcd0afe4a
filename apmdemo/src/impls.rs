//! Application implementation with JWT-based authentication.
//!
//! This module provides the concrete implementation of the Application trait,
//! wiring the SQLite adapter and a public-bucket media store together with
//! JWT bearer tokens as the identity provider.

use apm_core::{
    models::{BidId, Identity, ImageId, ListingId, UserId},
    ports::{Application, MediaStore},
};
use apm_sqlite::Db;
use headers::{Authorization, authorization::Bearer};
use jwt_simple::{
    claims::JWTClaims,
    prelude::{HS256Key, MACLike},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use time::OffsetDateTime;
use uuid::Uuid;

/// Configuration for the public-bucket media store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Base URL under which uploaded objects are publicly reachable
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:9000/apm-media".to_string()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// A media store backed by a public bucket the demo does not itself manage.
///
/// Clients upload directly to the bucket and register the resulting key; this
/// adapter only derives URLs. Releases are logged so an operator (or a bucket
/// lifecycle rule) can reclaim the storage.
#[derive(Clone)]
pub struct PublicMedia {
    base_url: String,
}

impl PublicMedia {
    /// Construct the adapter from its configuration.
    pub fn new(config: MediaConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl MediaStore for PublicMedia {
    type Error = Infallible;

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    async fn delete_object(&self, key: &str) -> Result<(), Infallible> {
        tracing::debug!(key, "object released");
        Ok(())
    }
}

/// Custom claims structure for JWT tokens.
///
/// Contains application-specific claims beyond standard JWT claims. The
/// standard `sub` claim carries the user id.
#[derive(Serialize, Deserialize)]
pub struct CustomJWTClaims {
    /// The caller's email address
    pub email: String,
    /// The caller's display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Main application implementation combining all system components.
///
/// This struct implements the Application trait and provides the integration
/// point for the database, the media store, and token verification.
#[derive(Clone)]
pub struct DemoApp {
    /// Database connection for persistent storage
    pub db: Db,
    /// HMAC key for JWT token verification
    pub key: HS256Key,
    /// URL derivation for uploaded images
    pub media: PublicMedia,
}

impl DemoApp {
    /// Extract and verify JWT claims from the authorization header.
    fn claims(&self, context: &Authorization<Bearer>) -> Option<JWTClaims<CustomJWTClaims>> {
        let token = context.0.token();
        self.key.verify_token::<CustomJWTClaims>(token, None).ok()
    }
}

// Entity ids are UUID v8: the creation timestamp splatted around the version
// and variant bits, a namespace nibble distinguishing the entity type, and 56
// random bits. Chronological ordering rides on the high word.
fn v8_id(namespace: u64, now: OffsetDateTime) -> Uuid {
    let rng56 = rand::rng().next_u64() >> 8; // 56 random bits

    // Current timestamp, partitioned into (48, 12, 4) bits
    let now = now.unix_timestamp() as u64;
    let now48 = 0xffff_ffff_ffff_0000 & now;
    let now12 = (0xfff0 & now) >> 4;
    let now04 = (0x000f & now) << 56;

    let hi = 0x0000_0000_0000_8000 | now48 | now12;
    let lo = (namespace << 60) | now04 | rng56;
    Uuid::from_u64_pair(hi, lo)
}

impl Application for DemoApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Media = PublicMedia;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn media(&self) -> &Self::Media {
        &self.media
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    async fn authenticate(&self, context: &Self::Context) -> Option<Identity> {
        // The standard sub: claim is the user id; email and name ride along
        // as custom claims and seed the user row on first interaction.
        let claims = self.claims(context)?;
        let user_id: UserId = claims.subject?.parse().ok()?;
        Some(Identity {
            user_id,
            email: claims.custom.email,
            name: claims.custom.name,
        })
    }

    fn generate_listing_id(&self) -> ListingId {
        v8_id(0x9, OffsetDateTime::now_utc()).into()
    }

    fn generate_bid_id(&self) -> BidId {
        v8_id(0xa, OffsetDateTime::now_utc()).into()
    }

    fn generate_image_id(&self) -> ImageId {
        v8_id(0xb, OffsetDateTime::now_utc()).into()
    }
}
