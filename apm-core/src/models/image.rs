use crate::models::{ImageId, ListingId};
use crate::ports::MediaStore;

/// Client-supplied image metadata.
///
/// The binary itself goes to object storage out of band; the marketplace
/// records only the storage key and the default flag.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ImageData {
    /// Object-storage key of the uploaded image
    pub key: String,
    /// Whether this image is the listing's primary thumbnail. At most one
    /// image per listing carries the flag; setting it clears any previous
    /// default.
    #[serde(default)]
    pub is_default: bool,
}

/// A stored listing image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct ImageRecord {
    /// Unique identifier for the image
    pub id: ImageId,
    /// The listing the image belongs to
    pub listing_id: ListingId,
    /// Object-storage key
    pub key: String,
    /// Public URL, derived from the key by the object-storage adapter.
    /// None until [`resolve_url`](Self::resolve_url) has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether this is the listing's primary thumbnail
    pub is_default: bool,
}

impl ImageRecord {
    /// Derive the public URL from the storage key.
    pub fn resolve_url<M: MediaStore>(&mut self, media: &M) {
        self.url = Some(media.public_url(&self.key));
    }
}
