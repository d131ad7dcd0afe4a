use crate::bidding::BidRejection;
use crate::models::{BidId, BidRecord, BidWithListing, Identity, ListingId, ListingRecord, UserId};
use time::OffsetDateTime;

/// The ways a bid placement can fail for domain reasons.
///
/// A superset of [`BidRejection`]: the repository also discovers missing
/// listings. All variants are terminal and non-retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BidFailure {
    /// No listing with the given id
    #[error("listing not found")]
    DoesNotExist,
    /// The amount was not a positive finite number
    #[error("bid amount must be a positive number")]
    InvalidAmount,
    /// The bidder is the listing's seller
    #[error("sellers cannot bid on their own listing")]
    SelfBid,
    /// The listing's end timestamp has passed
    #[error("this auction has ended")]
    AuctionEnded,
    /// The amount does not exceed the current price
    #[error("bid amount must be higher than the current price")]
    BidTooLow,
}

impl From<BidRejection> for BidFailure {
    fn from(value: BidRejection) -> Self {
        match value {
            BidRejection::InvalidAmount => Self::InvalidAmount,
            BidRejection::SelfBid => Self::SelfBid,
            BidRejection::AuctionEnded => Self::AuctionEnded,
            BidRejection::BidTooLow => Self::BidTooLow,
        }
    }
}

/// Repository interface for bid placement and retrieval.
pub trait BidRepository: super::Repository {
    /// Place a bid: evaluate `amount` against the listing's current state
    /// and, if accepted, record the bid and raise the listing price to
    /// `amount`: both writes in a single transaction, with the evaluation
    /// re-run against the row as read *inside* that transaction. Two
    /// concurrent bids therefore serialize: both may be recorded, but the
    /// final price is the larger amount and never decreases.
    ///
    /// The bidder's user row is upserted from `bidder` as part of the same
    /// transaction. `as_of` is the server-assigned bid timestamp.
    ///
    /// # Returns
    ///
    /// - `Ok(Ok(listing))`: the updated listing, bids newest-first
    /// - `Ok(Err(failure))`: the bid was rejected; nothing was written
    /// - `Err(error)`: infrastructure failure; the transaction rolled back
    fn place_bid(
        &self,
        bid_id: BidId,
        listing_id: ListingId,
        bidder: &Identity,
        amount: f64,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<ListingRecord, BidFailure>, Self::Error>> + Send;

    /// The bids against a listing, newest first, or None if the listing
    /// does not exist.
    fn bids_for_listing(
        &self,
        listing_id: ListingId,
    ) -> impl Future<Output = Result<Option<Vec<BidRecord>>, Self::Error>> + Send;

    /// All bids placed by `bidder_id`, newest first, each with its listing.
    fn bids_by_bidder(
        &self,
        bidder_id: UserId,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<BidWithListing>, Self::Error>> + Send;
}
