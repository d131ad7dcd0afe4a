use crate::models::{BidId, Identity, ImageId, ListingId};
use crate::ports::{MarketRepository, MediaStore};
use time::OffsetDateTime;

/// The application trait: everything a transport layer needs to serve the
/// marketplace.
///
/// An implementation ties together a persistence adapter, an object-storage
/// adapter, an identity provider (via `Context`, the per-request
/// authorization material), a clock, and id generation. Handlers are written
/// against this trait, so swapping the JWT provider or the database touches
/// nothing else.
pub trait Application {
    /// Per-request authorization material (e.g. a bearer token header)
    type Context;

    /// The persistence adapter
    type Repository: MarketRepository;

    /// The object-storage adapter
    type Media: MediaStore;

    /// Access the persistence adapter
    fn database(&self) -> &Self::Repository;

    /// Access the object-storage adapter
    fn media(&self) -> &Self::Media;

    /// The current wall-clock time.
    ///
    /// Every operation takes its timestamp from here exactly once, so a
    /// single request observes one consistent notion of "now".
    fn now(&self) -> OffsetDateTime;

    /// Resolve the caller's identity, or None for anonymous requests.
    fn authenticate(
        &self,
        context: &Self::Context,
    ) -> impl Future<Output = Option<Identity>> + Send;

    /// Mint an id for a new listing
    fn generate_listing_id(&self) -> ListingId;

    /// Mint an id for a new bid
    fn generate_bid_id(&self) -> BidId;

    /// Mint an id for a new image
    fn generate_image_id(&self) -> ImageId;
}
