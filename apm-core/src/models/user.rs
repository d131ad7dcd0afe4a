use crate::models::UserId;

/// A marketplace user, as exposed by the settings endpoints.
///
/// The password hash, when present, belongs to the credentials flow and is
/// never serialized out of the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct UserRecord {
    /// Unique identifier for the user
    pub id: UserId,
    /// Display name, if set
    pub name: Option<String>,
    /// Email address; unique across the marketplace
    pub email: String,
}

/// A partial settings update: absent fields are left unchanged.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct UserSettings {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
