use crate::models::{Identity, UserId, UserRecord, UserSettings};
use time::OffsetDateTime;

/// Repository interface for user accounts.
pub trait UserRepository: super::Repository {
    /// Upsert a user row from a resolved identity.
    ///
    /// Called on every authenticated write path so that identities minted by
    /// the external provider always have a backing row before foreign keys
    /// reference them. Name and email are refreshed from the identity.
    fn ensure_user(
        &self,
        identity: &Identity,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send;

    /// Look up a user by id.
    fn get_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send;

    /// Apply a partial settings update, returning the updated record or
    /// None if the user does not exist.
    fn update_settings(
        &self,
        user_id: UserId,
        settings: UserSettings,
        as_of: OffsetDateTime,
    ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send;

    /// Delete a user account and everything it owns: the user's bids, their
    /// listings, and those listings' bids and images.
    ///
    /// Returns the object-storage keys of all removed images so the caller
    /// can release the stored binaries, or None if the user does not exist.
    fn delete_account(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Vec<String>>, Self::Error>> + Send;
}
