use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::Backend;
use crate::error::{Result, StashError};
use crate::timestamp::{format_utc, parse_utc, EPOCH_UTC_STRING};

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Splits a `name=value; name=value` header into raw pairs.
fn pairs<'a>(header: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

/// The host's cookie string, with `document.cookie` semantics.
///
/// Reading yields every live cookie as `name=value` pairs joined by `"; "`,
/// cookies with longer paths first.
/// Writing takes a single `name=value; attr=...` assignment that creates,
/// replaces or (with a past `expires`) deletes one cookie.
pub trait CookieDocument: Send + Sync {
    fn cookie(&self) -> String;

    fn set_cookie(&self, assignment: &str);

    /// Whether the host has a cookie jar at all.
    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    path: String,
    expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    fn parse(assignment: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = assignment.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut path = "/".to_string();
        let mut expires = None;
        let mut max_age = None;
        for attribute in parts {
            let (key, val) = attribute.split_once('=').unwrap_or((attribute, ""));
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => path = val.trim().to_string(),
                "expires" => expires = parse_utc(val),
                "max-age" => max_age = val.trim().parse::<i64>().ok(),
                _ => {}
            }
        }
        // Max-Age wins over Expires.
        if let Some(seconds) = max_age {
            expires = Some(
                TimeDelta::try_seconds(seconds)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            );
        }

        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
            path,
            expires,
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

/// An in-memory cookie jar implementing [`CookieDocument`].
///
/// Cookies are identified by name and path. Expired cookies are dropped
/// when the jar is read. Clones share the same jar.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Arc<RwLock<Vec<StoredCookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieDocument for CookieJar {
    fn cookie(&self) -> String {
        let now = Utc::now();
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        cookies.retain(|cookie| !cookie.is_expired(now));
        let mut live: Vec<&StoredCookie> = cookies.iter().collect();
        // RFC 6265 5.4: longer paths first, otherwise creation order.
        live.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        live.into_iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set_cookie(&self, assignment: &str) {
        let now = Utc::now();
        let Some(cookie) = StoredCookie::parse(assignment, now) else {
            debug!("Ignoring malformed cookie assignment `{}`", assignment);
            return;
        };

        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        let existing = cookies
            .iter()
            .position(|c| c.name == cookie.name && c.path == cookie.path);

        match (existing, cookie.is_expired(now)) {
            (Some(index), true) => {
                cookies.remove(index);
            }
            (None, true) => {}
            (Some(index), false) => cookies[index] = cookie,
            (None, false) => cookies.push(cookie),
        }
    }
}

/// Cookie backend: keys and values are URL-encoded into `name=value; path=...`
/// assignments on a [`CookieDocument`], and the cookie header is parsed again
/// on every read.
#[derive(Debug, Clone)]
pub struct CookieStorage<D = CookieJar> {
    document: D,
    path: String,
}

impl<D: CookieDocument> CookieStorage<D> {
    pub fn new(document: D) -> Self {
        Self {
            document,
            path: "/".to_string(),
        }
    }

    /// Sets the `path` attribute written on every cookie
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    fn expire(&self, raw_name: &str) {
        self.document.set_cookie(&format!(
            "{}=; path={}; expires={}",
            raw_name, self.path, EPOCH_UTC_STRING
        ));
    }
}

impl<D: CookieDocument> Backend for CookieStorage<D> {
    fn get(&self, key: &str) -> Option<String> {
        let header = self.document.cookie();
        let found = pairs(&header)
            .find(|(name, _)| decode(name) == key)
            .map(|(_, value)| decode(value));
        found
    }

    fn set(&self, key: &str, value: &str, expires: Option<DateTime<Utc>>) -> Result<()> {
        if !self.document.is_available() {
            return Err(StashError::Backend("cookies are disabled".to_string()));
        }

        let mut assignment = format!("{}={}; path={}", encode(key), encode(value), self.path);
        if let Some(at) = expires {
            assignment.push_str("; expires=");
            assignment.push_str(&format_utc(&at));
        }
        self.document.set_cookie(&assignment);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.expire(&encode(key));
    }

    /// Expires every cookie in the header, including ones this crate did not
    /// write.
    fn clear(&self) {
        let header = self.document.cookie();
        for (name, _) in pairs(&header) {
            self.expire(name);
        }
    }

    fn is_present(&self) -> bool {
        self.document.is_available()
    }
}
