//! Stash-wide defaults and their environment overrides.

use log::warn;

use crate::store::StorageType;

/// Defaults applied when [`StashOptions`](crate::StashOptions) leave a field unset.
///
/// # Example
///
/// ```rust
/// use stash::{StashConfig, StorageType};
///
/// let config = StashConfig::default()
///     .with_default_type(StorageType::Session)
///     .with_cookie_path("/app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashConfig {
    /// Backend used when a call names none (default: local)
    pub default_type: StorageType,
    /// `path` attribute written on every cookie (default: `/`)
    pub cookie_path: String,
    /// Whether local falls back to session when unavailable (default: false)
    pub fallback: bool,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            default_type: StorageType::Local,
            cookie_path: "/".to_string(),
            fallback: false,
        }
    }
}

impl StashConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend used when a call names none
    pub fn with_default_type(mut self, default_type: StorageType) -> Self {
        self.default_type = default_type;
        self
    }

    /// Sets the cookie `path` attribute.
    ///
    /// Cookies are removed with the same path, so a stash only removes the
    /// cookies it can address.
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Enables session fallback for calls that don't set it themselves
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `STASH_DEFAULT_TYPE` - `local`, `session` or `cookie`
    /// - `STASH_COOKIE_PATH` - cookie path attribute
    /// - `STASH_FALLBACK` - `true`/`1` to enable session fallback
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("STASH_DEFAULT_TYPE") {
            match value.parse() {
                Ok(default_type) => config.default_type = default_type,
                Err(e) => warn!("Ignoring STASH_DEFAULT_TYPE: {}", e),
            }
        }
        if let Ok(path) = std::env::var("STASH_COOKIE_PATH") {
            if !path.is_empty() {
                config.cookie_path = path;
            }
        }
        if let Ok(value) = std::env::var("STASH_FALLBACK") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.fallback = true,
                "0" | "false" | "no" => config.fallback = false,
                other => warn!("Ignoring STASH_FALLBACK: expected a boolean, got `{}`", other),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StashConfig::default();
        assert_eq!(config.default_type, StorageType::Local);
        assert_eq!(config.cookie_path, "/");
        assert!(!config.fallback);
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = StashConfig::new()
            .with_default_type(StorageType::Cookie)
            .with_cookie_path("/admin")
            .with_fallback(true);
        assert_eq!(config.default_type, StorageType::Cookie);
        assert_eq!(config.cookie_path, "/admin");
        assert!(config.fallback);
    }

    // The only test touching these variables, so it cannot race another test.
    #[test]
    fn test_from_env() {
        std::env::set_var("STASH_DEFAULT_TYPE", "session");
        std::env::set_var("STASH_COOKIE_PATH", "/shop");
        std::env::set_var("STASH_FALLBACK", "TRUE");
        let config = StashConfig::from_env();
        assert_eq!(config.default_type, StorageType::Session);
        assert_eq!(config.cookie_path, "/shop");
        assert!(config.fallback);

        std::env::set_var("STASH_DEFAULT_TYPE", "floppy");
        std::env::set_var("STASH_FALLBACK", "maybe");
        let config = StashConfig::from_env();
        assert_eq!(config.default_type, StorageType::Local);
        assert!(!config.fallback);

        std::env::remove_var("STASH_DEFAULT_TYPE");
        std::env::remove_var("STASH_COOKIE_PATH");
        std::env::remove_var("STASH_FALLBACK");
    }
}
