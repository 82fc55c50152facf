//! Per-call options: which backend, when the entry expires, and whether an
//! unavailable local backend may fall back to session storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::StashError;

/// Selects one of the three backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Durable storage that survives restarts.
    #[default]
    Local,
    /// Storage scoped to the current session.
    Session,
    /// The cookie jar.
    Cookie,
}

impl StorageType {
    pub const ALL: [StorageType; 3] = [StorageType::Local, StorageType::Session, StorageType::Cookie];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Local => "local",
            StorageType::Session => "session",
            StorageType::Cookie => "cookie",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "session" => Ok(StorageType::Session),
            "cookie" => Ok(StorageType::Cookie),
            _ => Err(StashError::UnknownStorageType(s.to_string())),
        }
    }
}

/// When an entry stops being readable.
///
/// Relative durations parse from `<integer><unit>` where unit is one of
/// `ms`, `s`, `m`, `h` or `d`:
///
/// ```rust
/// use stash::Expiration;
///
/// let in_a_day: Expiration = "1d".parse().unwrap();
/// assert!("5x".parse::<Expiration>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires at a fixed instant.
    At(DateTime<Utc>),
    /// Expires this long after the write.
    In(TimeDelta),
}

impl Expiration {
    /// Resolves to an absolute instant relative to `now`.
    ///
    /// Durations that overflow the calendar saturate to the latest
    /// representable instant.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Expiration::At(at) => *at,
            Expiration::In(delta) => now
                .checked_add_signed(*delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl FromStr for Expiration {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StashError::InvalidExpiration(s.to_string());
        let text = s.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, unit) = text.split_at(split);
        if digits.is_empty() {
            return Err(invalid());
        }
        let amount: i64 = digits.parse().map_err(|_| invalid())?;
        let delta = match unit {
            "ms" => TimeDelta::try_milliseconds(amount),
            "s" => TimeDelta::try_seconds(amount),
            "m" => TimeDelta::try_minutes(amount),
            "h" => TimeDelta::try_hours(amount),
            "d" => TimeDelta::try_days(amount),
            _ => None,
        };
        delta.map(Expiration::In).ok_or_else(invalid)
    }
}

impl From<DateTime<Utc>> for Expiration {
    fn from(at: DateTime<Utc>) -> Self {
        Expiration::At(at)
    }
}

impl From<TimeDelta> for Expiration {
    fn from(delta: TimeDelta) -> Self {
        Expiration::In(delta)
    }
}

impl From<std::time::Duration> for Expiration {
    fn from(duration: std::time::Duration) -> Self {
        Expiration::In(TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX))
    }
}

/// Options accepted by every [`Stash`](crate::Stash) operation.
///
/// Fields left as `None` take their value from the stash's
/// [`StashConfig`](crate::StashConfig).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StashOptions {
    pub storage: Option<StorageType>,
    pub expires: Option<Expiration>,
    pub fallback: Option<bool>,
}

impl StashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local() -> Self {
        Self::new().with_type(StorageType::Local)
    }

    pub fn session() -> Self {
        Self::new().with_type(StorageType::Session)
    }

    pub fn cookie() -> Self {
        Self::new().with_type(StorageType::Cookie)
    }

    pub fn with_type(mut self, storage: StorageType) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets when entries written with these options expire.
    ///
    /// Only `set` reads this; `get` honours whatever expiry was stored.
    pub fn with_expires(mut self, expires: impl Into<Expiration>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Allows an unavailable local backend to be replaced by session storage.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = Some(fallback);
        self
    }
}
