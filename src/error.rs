//! Error types for stash operations.

use thiserror::Error;

use crate::store::StorageType;

/// Errors reported by the fallible `try_*` operations of [`Stash`](crate::Stash).
///
/// The plain operations never return these; they log them and degrade to a
/// no-op or `None`.
#[derive(Error, Debug)]
pub enum StashError {
    /// The requested backend is absent or refuses writes.
    #[error("{0} storage is not available")]
    Unavailable(StorageType),

    /// A relative expiration could not be parsed.
    #[error("invalid expiration `{0}`: expected <integer><ms|s|m|h|d>")]
    InvalidExpiration(String),

    /// Storage type text did not name a known backend.
    #[error("unknown storage type `{0}`")]
    UnknownStorageType(String),

    /// The value could not be encoded as JSON.
    #[error("failed to serialize value for `{key}`")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored text is not a valid entry, or its value does not decode
    /// into the requested type.
    #[error("failed to decode stored value for `{key}`")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The host rejected a write (for example, quota exceeded).
    #[error("backend rejected write: {0}")]
    Backend(String),
}

impl StashError {
    /// Returns `true` if this error means the backend could not be used at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StashError::Unavailable(_))
    }
}

pub type Result<T, E = StashError> = std::result::Result<T, E>;
