use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{Backend, CookieJar, CookieStorage, MemoryStorage, Unavailable};
use crate::config::StashConfig;
use crate::error::{Result, StashError};
use crate::store::entry::Entry;
use crate::store::options::{StashOptions, StorageType};

struct StashInner {
    local: Box<dyn Backend>,
    session: Box<dyn Backend>,
    cookie: Box<dyn Backend>,
    config: StashConfig,
}

/// One get/set/remove/clear interface over local, session and cookie storage.
///
/// Values are stored as a JSON envelope `{"value": ..., "expires": ...}`.
/// Expired entries are removed lazily, when a read observes them.
///
/// The plain operations never fail: errors are logged and read as `None`
/// or a no-op. The `try_*` twins report them instead.
///
/// # Example
///
/// ```rust
/// use stash::{Stash, StashOptions};
///
/// let stash = Stash::in_memory();
/// stash.set("theme", &"dark", &StashOptions::local());
/// assert_eq!(stash.get::<String>("theme", &StashOptions::local()).as_deref(), Some("dark"));
///
/// let short = StashOptions::session().with_expires("10m".parse::<stash::Expiration>().unwrap());
/// stash.set("otp", &123456, &short);
/// ```
#[derive(Clone)]
pub struct Stash {
    inner: Arc<StashInner>,
}

impl Stash {
    /// Creates a stash over the given backends with default configuration
    pub fn new(
        local: impl Backend + 'static,
        session: impl Backend + 'static,
        cookie: impl Backend + 'static,
    ) -> Self {
        Self::with_config(local, session, cookie, StashConfig::default())
    }

    pub fn with_config(
        local: impl Backend + 'static,
        session: impl Backend + 'static,
        cookie: impl Backend + 'static,
        config: StashConfig,
    ) -> Self {
        Self {
            inner: Arc::new(StashInner {
                local: Box::new(local),
                session: Box::new(session),
                cookie: Box::new(cookie),
                config,
            }),
        }
    }

    /// Creates a stash over fresh in-memory maps and cookie jar
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(StashConfig::default())
    }

    pub fn in_memory_with_config(config: StashConfig) -> Self {
        let cookies = CookieStorage::new(CookieJar::new()).with_path(config.cookie_path.clone());
        Self::with_config(MemoryStorage::new(), MemoryStorage::new(), cookies, config)
    }

    /// Creates a stash for a host without storage. Every operation is a no-op
    /// and every read is `None`.
    pub fn detached() -> Self {
        Self::new(Unavailable, Unavailable, Unavailable)
    }

    /// Creates a stash over the browser's `localStorage`, `sessionStorage`
    /// and `document.cookie`.
    #[cfg(feature = "web")]
    pub fn browser() -> Self {
        Self::browser_with_config(StashConfig::default())
    }

    #[cfg(feature = "web")]
    pub fn browser_with_config(config: StashConfig) -> Self {
        use crate::backend::{HtmlCookies, WebStorage};

        let cookies = CookieStorage::new(HtmlCookies).with_path(config.cookie_path.clone());
        Self::with_config(WebStorage::local(), WebStorage::session(), cookies, config)
    }

    pub fn config(&self) -> &StashConfig {
        &self.inner.config
    }

    /// Returns the backend for `storage`.
    pub fn backend(&self, storage: StorageType) -> &dyn Backend {
        match storage {
            StorageType::Local => &*self.inner.local,
            StorageType::Session => &*self.inner.session,
            StorageType::Cookie => &*self.inner.cookie,
        }
    }

    /// Checks whether `storage` exists and accepts writes.
    pub fn is_available(&self, storage: StorageType) -> bool {
        self.backend(storage).is_available()
    }

    /// Picks the backend named by `options`, redirecting an absent local
    /// backend to session storage when fallback is enabled.
    ///
    /// Only presence is checked, never writability, so a full backend can
    /// still be read, removed from and cleared.
    fn resolve(&self, options: &StashOptions) -> Result<(StorageType, &dyn Backend)> {
        let storage = options.storage.unwrap_or(self.inner.config.default_type);
        let backend = self.backend(storage);
        if backend.is_present() {
            return Ok((storage, backend));
        }

        let fallback = options.fallback.unwrap_or(self.inner.config.fallback);
        if storage == StorageType::Local && fallback {
            let session = self.backend(StorageType::Session);
            if session.is_present() {
                debug!("Local storage unavailable, falling back to session storage");
                return Ok((StorageType::Session, session));
            }
        }
        Err(StashError::Unavailable(storage))
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn try_set<T>(&self, key: &str, value: &T, options: &StashOptions) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let (_, backend) = self.resolve(options)?;
        let value = serde_json::to_value(value).map_err(|source| StashError::Serialize {
            key: key.to_string(),
            source,
        })?;
        let expires = options.expires.map(|expires| expires.resolve(Utc::now()));
        let entry = Entry::new(value, expires);
        let text = entry.encode().map_err(|source| StashError::Serialize {
            key: key.to_string(),
            source,
        })?;
        backend.set(key, &text, expires)
    }

    /// Reads the entry for `key` without decoding its value. Expired entries
    /// are removed and read as `None`.
    fn read_entry(&self, key: &str, options: &StashOptions) -> Result<Option<Entry>> {
        let (storage, backend) = self.resolve(options)?;
        let Some(text) = backend.get(key).filter(|text| !text.is_empty()) else {
            return Ok(None);
        };

        let entry = Entry::decode(&text).map_err(|source| StashError::Deserialize {
            key: key.to_string(),
            source,
        })?;
        if entry.is_expired() {
            debug!("Entry `{}` in {} storage expired, removing", key, storage);
            backend.remove(key);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Retrieves the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    pub fn try_get<T>(&self, key: &str, options: &StashOptions) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(entry) = self.read_entry(key, options)? else {
            return Ok(None);
        };
        serde_json::from_value(entry.into_value())
            .map(Some)
            .map_err(|source| StashError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    pub fn try_contains(&self, key: &str, options: &StashOptions) -> Result<bool> {
        Ok(self.read_entry(key, options)?.is_some())
    }

    pub fn try_remove(&self, key: &str, options: &StashOptions) -> Result<()> {
        let (_, backend) = self.resolve(options)?;
        backend.remove(key);
        Ok(())
    }

    /// Empties the whole backend. For cookies this expires every cookie,
    /// not only the ones written through this stash.
    pub fn try_clear(&self, options: &StashOptions) -> Result<()> {
        let (_, backend) = self.resolve(options)?;
        backend.clear();
        Ok(())
    }

    pub fn set<T>(&self, key: &str, value: &T, options: &StashOptions)
    where
        T: Serialize + ?Sized,
    {
        if let Err(e) = self.try_set(key, value, options) {
            error!("Cannot set `{}`: {}", key, e);
        }
    }

    pub fn get<T>(&self, key: &str, options: &StashOptions) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.try_get(key, options).unwrap_or_else(|e| {
            warn!("Cannot get `{}`: {}", key, e);
            None
        })
    }

    pub fn contains(&self, key: &str, options: &StashOptions) -> bool {
        self.try_contains(key, options).unwrap_or_else(|e| {
            warn!("Cannot read `{}`: {}", key, e);
            false
        })
    }

    pub fn remove(&self, key: &str, options: &StashOptions) {
        if let Err(e) = self.try_remove(key, options) {
            warn!("Cannot remove `{}`: {}", key, e);
        }
    }

    pub fn clear(&self, options: &StashOptions) {
        if let Err(e) = self.try_clear(options) {
            warn!("Cannot clear storage: {}", e);
        }
    }
}

impl std::fmt::Debug for Stash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stash")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
