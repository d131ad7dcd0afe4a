use crate::models::{ListingData, ListingId, ListingQuery, ListingRecord, ListingSummary, UserId};
use time::OffsetDateTime;

/// The ways a listing mutation can fail for domain reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ListingFailure {
    /// No listing with the given id
    #[error("listing not found")]
    DoesNotExist,
    /// The caller is not the listing's seller
    #[error("only the seller may modify a listing")]
    AccessDenied,
    /// The auction has ended and the listing can no longer be edited
    #[error("this auction has ended")]
    AuctionEnded,
}

/// Repository interface for listing CRUD and the browse query.
pub trait ListingRepository: super::Repository {
    /// Create a new listing owned by `seller_id` with the given asking price.
    ///
    /// The seller row must already exist (see
    /// [`UserRepository::ensure_user`](super::UserRepository::ensure_user)).
    fn create_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
        data: ListingData,
        price: f64,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<ListingRecord, Self::Error>> + Send;

    /// Retrieve a listing with its images and its bids ordered newest-first,
    /// status computed as of `as_of`.
    fn get_listing(
        &self,
        listing_id: ListingId,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Option<ListingRecord>, Self::Error>> + Send;

    /// Browse active listings matching every supplied filter (AND semantics;
    /// absent filters impose no constraint; price bounds inclusive), most
    /// recently created first.
    fn query_listings(
        &self,
        query: &ListingQuery,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<ListingSummary>, Self::Error>> + Send;

    /// Replace the seller-supplied description of a listing.
    ///
    /// Only the owning seller may edit, and only while the auction is open;
    /// the open check uses the same predicate as bid placement.
    fn update_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
        data: ListingData,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<ListingRecord, ListingFailure>, Self::Error>> + Send;

    /// Delete a listing, cascading to its bids and images.
    ///
    /// Only the owning seller may delete. Returns the object-storage keys of
    /// the removed images so the caller can release the stored binaries.
    fn delete_listing(
        &self,
        listing_id: ListingId,
        seller_id: UserId,
    ) -> impl Future<Output = Result<Result<Vec<String>, ListingFailure>, Self::Error>> + Send;

    /// All listings owned by `seller_id`, newest first, with bid counts.
    fn listings_by_seller(
        &self,
        seller_id: UserId,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<ListingSummary>, Self::Error>> + Send;
}
