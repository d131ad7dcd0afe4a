//! Type definitions for the SQLite implementation.
//!
//! Public types cover the stored timestamp representation; the internal
//! types map database rows onto the domain records from `apm-core`. Entity
//! ids cross the boundary as text columns and are parsed on the way out via
//! their `TryFrom<String>` conversions.

use apm_core::bidding::is_open;
use apm_core::models::{
    BidId, BidRecord, ImageId, ImageRecord, ListingData, ListingId, ListingRecord, ListingStatus,
    ListingSummary, UserId, UserRecord,
};
use time::OffsetDateTime;

/// A stored timestamp: milliseconds since the Unix epoch, UTC.
///
/// Integer storage keeps SQL comparisons (`end_date > ?`) exact, which the
/// active-listing filter relies on; RFC3339 text would order incorrectly
/// across differing subsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Timestamp(pub i64);

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self((value.unix_timestamp_nanos() / 1_000_000) as i64)
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(value: Timestamp) -> Self {
        // stored timestamps are server-written millis, always in range
        OffsetDateTime::from_unix_timestamp_nanos(value.0 as i128 * 1_000_000)
            .expect("stored timestamp out of range")
    }
}

fn status(end_date: Timestamp, as_of: OffsetDateTime) -> ListingStatus {
    if is_open(end_date.into(), as_of) {
        ListingStatus::Active
    } else {
        ListingStatus::Ended
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ListingRow {
    #[sqlx(try_from = "String")]
    pub id: ListingId,
    #[sqlx(try_from = "String")]
    pub seller_id: UserId,
    pub seller_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub condition: String,
    pub location: String,
    pub price: f64,
    pub end_date: Timestamp,
    pub created_at: Timestamp,
}

impl ListingRow {
    pub fn into_record(
        self,
        as_of: OffsetDateTime,
        images: Vec<ImageRecord>,
        bids: Vec<BidRecord>,
    ) -> ListingRecord {
        ListingRecord {
            id: self.id,
            seller_id: self.seller_id,
            seller_name: self.seller_name,
            status: status(self.end_date, as_of),
            price: self.price,
            created_at: self.created_at.into(),
            data: ListingData {
                title: self.title,
                description: self.description,
                category: self.category,
                make: self.make,
                model: self.model,
                year: self.year,
                condition: self.condition,
                location: self.location,
                end_date: self.end_date.into(),
            },
            images,
            bids,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ListingSummaryRow {
    #[sqlx(try_from = "String")]
    pub id: ListingId,
    #[sqlx(try_from = "String")]
    pub seller_id: UserId,
    pub seller_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub condition: String,
    pub location: String,
    pub price: f64,
    pub end_date: Timestamp,
    pub created_at: Timestamp,
    pub bid_count: i64,
}

impl ListingSummaryRow {
    pub fn into_summary(self, as_of: OffsetDateTime, images: Vec<ImageRecord>) -> ListingSummary {
        ListingSummary {
            id: self.id,
            seller_id: self.seller_id,
            seller_name: self.seller_name,
            status: status(self.end_date, as_of),
            price: self.price,
            created_at: self.created_at.into(),
            data: ListingData {
                title: self.title,
                description: self.description,
                category: self.category,
                make: self.make,
                model: self.model,
                year: self.year,
                condition: self.condition,
                location: self.location,
                end_date: self.end_date.into(),
            },
            images,
            bid_count: self.bid_count,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BidRow {
    #[sqlx(try_from = "String")]
    pub id: BidId,
    #[sqlx(try_from = "String")]
    pub listing_id: ListingId,
    #[sqlx(try_from = "String")]
    pub bidder_id: UserId,
    pub bidder_name: Option<String>,
    pub amount: f64,
    pub created_at: Timestamp,
}

impl From<BidRow> for BidRecord {
    fn from(row: BidRow) -> Self {
        BidRecord {
            id: row.id,
            listing_id: row.listing_id,
            bidder_id: row.bidder_id,
            bidder_name: row.bidder_name,
            amount: row.amount,
            created_at: row.created_at.into(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ImageRow {
    #[sqlx(try_from = "String")]
    pub id: ImageId,
    #[sqlx(try_from = "String")]
    pub listing_id: ListingId,
    pub key: String,
    pub is_default: bool,
}

impl From<ImageRow> for ImageRecord {
    fn from(row: ImageRow) -> Self {
        ImageRecord {
            id: row.id,
            listing_id: row.listing_id,
            key: row.key,
            url: None,
            is_default: row.is_default,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    #[sqlx(try_from = "String")]
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}
