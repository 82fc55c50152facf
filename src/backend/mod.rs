//! Storage backends.
//!
//! A backend is a plain key/text map. Encoding, expiry and backend selection
//! are the stash's job; a backend only stores the text it is given. This keeps
//! host storage swappable: in-memory maps natively and in tests, browser
//! storage under the `web` feature.

mod cookie;
mod memory;
#[cfg(feature = "web")]
mod web;

use chrono::{DateTime, Utc};

use crate::error::{Result, StashError};

pub use cookie::{CookieDocument, CookieJar, CookieStorage};
pub use memory::MemoryStorage;
#[cfg(feature = "web")]
pub use web::{HtmlCookies, WebStorage};

/// Key written and removed again by [`Backend::is_available`].
pub const PROBE_KEY: &str = "__stash_probe__";

/// Key/text storage provided by the host environment.
pub trait Backend: Send + Sync {
    /// Gets the text stored under `key`, or None if not found
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    ///
    /// `expires` is the entry's expiry; backends with native expiry (cookies)
    /// apply it, others ignore it.
    fn set(&self, key: &str, value: &str, expires: Option<DateTime<Utc>>) -> Result<()>;

    /// Removes the entry for the given key
    fn remove(&self, key: &str);

    /// Removes every entry
    fn clear(&self);

    /// Whether the host provides this storage at all. Must not write.
    ///
    /// The stash routes every operation, fallback included, on this check.
    fn is_present(&self) -> bool {
        true
    }

    /// Checks that the backend exists and accepts writes.
    ///
    /// Writes [`PROBE_KEY`] and removes it again. A value already stored
    /// under that key is put back afterwards.
    fn is_available(&self) -> bool {
        if !self.is_present() {
            return false;
        }
        let previous = self.get(PROBE_KEY);
        if self.set(PROBE_KEY, PROBE_KEY, None).is_err() {
            return false;
        }
        match previous {
            Some(previous) => self.set(PROBE_KEY, &previous, None).is_ok(),
            None => {
                self.remove(PROBE_KEY);
                true
            }
        }
    }
}

/// A backend for hosts without the storage capability. Reads find nothing and
/// writes are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Backend for Unavailable {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str, _expires: Option<DateTime<Utc>>) -> Result<()> {
        Err(StashError::Backend("host storage is absent".to_string()))
    }

    fn remove(&self, _key: &str) {}

    fn clear(&self) {}

    fn is_present(&self) -> bool {
        false
    }
}
