use crate::models::{BidId, ListingId, ListingSummary, UserId, datetime_schema};
use time::OffsetDateTime;

/// A recorded bid against a listing.
///
/// Bids are immutable once created: never updated or deleted in normal
/// operation, and retained permanently once accepted. Rejected bids are
/// never persisted at all.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct BidRecord {
    /// Unique identifier for the bid
    pub id: BidId,
    /// The listing this bid was placed against
    pub listing_id: ListingId,
    /// The bidder
    pub bidder_id: UserId,
    /// The bidder's display name, if they have set one
    pub bidder_name: Option<String>,
    /// The bid amount
    pub amount: f64,
    /// Server-assigned creation timestamp
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(schema_with = "datetime_schema")]
    pub created_at: OffsetDateTime,
}

/// A bid together with the listing it was placed against, as shown on the
/// bidder's dashboard.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct BidWithListing {
    /// The bid itself
    #[serde(flatten)]
    pub bid: BidRecord,
    /// The listing, in summary form
    pub listing: ListingSummary,
}
