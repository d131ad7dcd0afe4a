mod application;
mod bid;
mod image;
mod listing;
mod media;
mod user;

pub use application::Application;
pub use bid::{BidFailure, BidRepository};
pub use image::{ImageFailure, ImageRepository};
pub use listing::{ListingFailure, ListingRepository};
pub use media::MediaStore;
pub use user::UserRepository;

/// Base trait shared by all repository ports.
///
/// Domain failures (a missing listing, a rejected bid) are expressed in the
/// method signatures; `Error` covers everything infrastructural, such as a
/// failed connection or a poisoned transaction, and surfaces as a 500.
pub trait Repository {
    /// The adapter's infrastructure error type
    type Error: std::error::Error + Send + Sync + 'static;
}

/// The marker trait implied by a complete persistence adapter.
pub trait MarketRepository:
    ListingRepository + BidRepository + ImageRepository + UserRepository
{
}
