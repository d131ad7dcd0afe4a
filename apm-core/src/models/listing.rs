use crate::models::{BidRecord, ImageRecord, ListingId, UserId, datetime_schema};
use crate::ports::MediaStore;
use time::OffsetDateTime;

/// The seller-supplied description of a listing.
///
/// These fields are set at creation and may be edited by the seller while the
/// auction is still open. The current price is *not* part of this payload:
/// once created, price moves only through accepted bids.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ListingData {
    /// Short title of the part for sale
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Part category (e.g. "engine", "suspension")
    pub category: String,
    /// Vehicle make the part fits, if applicable
    #[serde(default)]
    pub make: Option<String>,
    /// Vehicle model the part fits, if applicable
    #[serde(default)]
    pub model: Option<String>,
    /// Vehicle year, if applicable
    #[serde(default)]
    pub year: Option<i64>,
    /// Condition of the part (e.g. "new", "used")
    pub condition: String,
    /// Where the part is located
    pub location: String,
    /// When the auction closes. Never enforced by a background job; every
    /// operation compares this against the wall clock at the moment it runs.
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(schema_with = "datetime_schema")]
    pub end_date: OffsetDateTime,
}

/// Computed lifecycle state of a listing.
///
/// Never stored: derived on demand by comparing the end timestamp against
/// wall-clock time (see [`crate::bidding::is_open`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// The auction is open for bids
    Active,
    /// The end timestamp has passed
    Ended,
}

/// A full listing, as returned by the single-listing read and bid endpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ListingRecord {
    /// Unique identifier for the listing
    pub id: ListingId,
    /// The owning seller
    pub seller_id: UserId,
    /// The seller's display name, if they have set one
    pub seller_name: Option<String>,
    /// The seller-supplied description
    #[serde(flatten)]
    pub data: ListingData,
    /// Current price: the highest accepted bid, or the original ask if none.
    /// Monotonically non-decreasing over the listing's lifetime.
    pub price: f64,
    /// Computed lifecycle state as of the serving request
    pub status: ListingStatus,
    /// When the listing was created
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(schema_with = "datetime_schema")]
    pub created_at: OffsetDateTime,
    /// Attached images, default image first
    pub images: Vec<ImageRecord>,
    /// Bids against this listing, newest first
    pub bids: Vec<BidRecord>,
}

impl ListingRecord {
    /// Fill in the public URL of every attached image.
    pub fn resolve_urls<M: MediaStore>(&mut self, media: &M) {
        for image in &mut self.images {
            image.resolve_url(media);
        }
    }
}

/// A listing as it appears in query results and the seller dashboard:
/// no bid collection, just a count.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ListingSummary {
    /// Unique identifier for the listing
    pub id: ListingId,
    /// The owning seller
    pub seller_id: UserId,
    /// The seller's display name, if they have set one
    pub seller_name: Option<String>,
    /// The seller-supplied description
    #[serde(flatten)]
    pub data: ListingData,
    /// Current price
    pub price: f64,
    /// Computed lifecycle state as of the serving request
    pub status: ListingStatus,
    /// When the listing was created
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(schema_with = "datetime_schema")]
    pub created_at: OffsetDateTime,
    /// Attached images, default image first
    pub images: Vec<ImageRecord>,
    /// Number of bids recorded against the listing
    pub bid_count: i64,
}

impl ListingSummary {
    /// Fill in the public URL of every attached image.
    pub fn resolve_urls<M: MediaStore>(&mut self, media: &M) {
        for image in &mut self.images {
            image.resolve_url(media);
        }
    }
}

/// An optional filter set for browsing active listings.
///
/// Every field is independently optional; supplied filters combine with AND
/// semantics and absent filters impose no constraint. The price range is
/// inclusive on both bounds.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ListingQuery {
    /// Restrict to a part category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Restrict to a vehicle make
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    /// Restrict to a vehicle model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Lowest acceptable current price (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Highest acceptable current price (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Restrict to a part condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
