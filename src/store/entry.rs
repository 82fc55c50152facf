use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::{format_utc, parse_utc};

/// The envelope written to every backend: `{"value": ..., "expires": ...}`.
///
/// `expires` is kept as text exactly as stored. An expiry that cannot be
/// parsed never compares as past, so such entries never expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    value: Value,
    #[serde(default)]
    expires: Option<String>,
}

impl Entry {
    /// Creates an entry, truncating the expiry to whole seconds.
    pub fn new(value: Value, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            expires: expires.as_ref().map(format_utc),
        }
    }

    /// Returns the stored value
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the expiry as stored, if any
    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires.as_deref().and_then(parse_utc)
    }

    /// Checks if the expiry is strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
