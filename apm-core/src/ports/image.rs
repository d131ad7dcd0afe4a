use crate::models::{ImageData, ImageId, ImageRecord, ListingId, UserId};
use time::OffsetDateTime;

/// The ways an image mutation can fail for domain reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImageFailure {
    /// No listing or image with the given id
    #[error("image or listing not found")]
    DoesNotExist,
    /// The caller is not the owning seller
    #[error("only the seller may manage a listing's images")]
    AccessDenied,
}

/// Repository interface for listing image metadata.
///
/// The binaries live in object storage; this port tracks keys and the
/// default flag only.
pub trait ImageRepository: super::Repository {
    /// Attach image metadata to a listing owned by `seller_id`.
    ///
    /// If `data.is_default` is set, any previous default image of the
    /// listing loses the flag in the same transaction; at most one image
    /// per listing is ever the default.
    fn attach_image(
        &self,
        image_id: ImageId,
        listing_id: ListingId,
        seller_id: UserId,
        data: ImageData,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Result<ImageRecord, ImageFailure>, Self::Error>> + Send;

    /// Remove an image from a listing owned by `seller_id`.
    ///
    /// Returns the object-storage key so the caller can release the binary.
    fn delete_image(
        &self,
        image_id: ImageId,
        seller_id: UserId,
    ) -> impl Future<Output = Result<Result<String, ImageFailure>, Self::Error>> + Send;
}
