use crate::models::UserId;

/// A resolved, authenticated user identity.
///
/// Produced by the identity provider once per request; anonymous requests
/// carry no identity. The marketplace treats the id as the canonical user
/// reference everywhere; email and name are display/contact material only.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct Identity {
    /// Canonical user id
    pub user_id: UserId,
    /// The user's (unique) email address
    pub email: String,
    /// Optional display name
    pub name: Option<String>,
}
