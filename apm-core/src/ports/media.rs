/// The object-storage collaborator.
///
/// Uploading, cropping, and resizing binaries happens outside this system;
/// the marketplace only derives public URLs from storage keys and releases
/// objects when their metadata is cascaded away.
pub trait MediaStore: Send + Sync {
    /// The adapter's error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Derive the public URL for a stored object.
    fn public_url(&self, key: &str) -> String;

    /// Delete a stored object. Deleting a missing object is not an error.
    fn delete_object(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
