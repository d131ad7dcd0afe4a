mod auth;
mod bid;
mod image;
mod listing;
mod user;

pub use auth::Identity;
pub use bid::{BidRecord, BidWithListing};
pub use image::{ImageData, ImageRecord};
pub use listing::{ListingData, ListingQuery, ListingRecord, ListingStatus, ListingSummary};
pub use user::{UserRecord, UserSettings};

macro_rules! uuid_wrapper {
    ($struct:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Hash,
            PartialEq,
            Eq,
            Clone,
            Copy,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            schemars::JsonSchema,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $struct(pub uuid::Uuid);

        impl From<uuid::Uuid> for $struct {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for uuid::Uuid {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $struct {
            type Err = <uuid::Uuid as std::str::FromStr>::Err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        // Ids cross the persistence boundary as text columns
        impl TryFrom<String> for $struct {
            type Error = <uuid::Uuid as std::str::FromStr>::Err;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_wrapper!(UserId, "Unique identifier for a marketplace user");
uuid_wrapper!(ListingId, "Unique identifier for a listing");
uuid_wrapper!(BidId, "Unique identifier for a bid against a listing");
uuid_wrapper!(ImageId, "Unique identifier for a listing image");

/// Helper function to generate a JSON schema for `time::OffsetDateTime`.
///
/// The schemars crate has no built-in support for the time crate's
/// OffsetDateTime type, so fields carrying one point here.
pub fn datetime_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "format": "date-time",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // The id newtypes appear in every wire type, so their schemas must be
    // derivable alongside the records that embed them.
    #[test]
    fn id_newtypes_are_schema_aware() {
        let schema = schemars::schema_for!(UserId);
        assert_eq!(schema.as_value()["format"], "uuid");

        let schema = schemars::schema_for!(ListingRecord);
        let json = serde_json::to_string(schema.as_value()).unwrap();
        assert!(json.contains(r#""format":"uuid""#));
    }
}
