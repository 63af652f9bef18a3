//! Typed entity identifiers (UUID newtypes).
//!
//! Every persisted entity gets its own id type so a `ClipId` can never be
//! passed where a `TrackId` is expected. Ids serialize as plain UUID strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

entity_id!(
    /// Identifies a project (one per database file).
    ProjectId
);
entity_id!(
    /// Identifies a sequence (a timeline).
    SequenceId
);
entity_id!(
    /// Identifies a track within a sequence.
    TrackId
);
entity_id!(
    /// Identifies a clip on a track.
    ClipId
);
entity_id!(
    /// Identifies an imported media file.
    MediaId
);
