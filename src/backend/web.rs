//! Browser storage through `web-sys`.
//!
//! Handles hold no JS objects; the window is looked up on every call, so a
//! missing window (workers, server rendering) reads as unavailable storage.

use chrono::{DateTime, Utc};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use super::{Backend, CookieDocument};
use crate::error::{Result, StashError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebStorageKind {
    Local,
    Session,
}

/// `window.localStorage` or `window.sessionStorage`.
#[derive(Debug, Clone, Copy)]
pub struct WebStorage {
    kind: WebStorageKind,
}

impl WebStorage {
    pub fn local() -> Self {
        Self {
            kind: WebStorageKind::Local,
        }
    }

    pub fn session() -> Self {
        Self {
            kind: WebStorageKind::Session,
        }
    }

    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        match self.kind {
            WebStorageKind::Local => window.local_storage().ok()?,
            WebStorageKind::Session => window.session_storage().ok()?,
        }
    }
}

impl Backend for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str, _expires: Option<DateTime<Utc>>) -> Result<()> {
        let storage = self
            .storage()
            .ok_or_else(|| StashError::Backend("web storage is absent".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| StashError::Backend(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage() {
            let _ = storage.remove_item(key);
        }
    }

    fn clear(&self) {
        if let Some(storage) = self.storage() {
            let _ = storage.clear();
        }
    }

    fn is_present(&self) -> bool {
        self.storage().is_some()
    }
}

/// `document.cookie` of the current window.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCookies;

impl HtmlCookies {
    fn document() -> Option<HtmlDocument> {
        web_sys::window()?.document()?.dyn_into::<HtmlDocument>().ok()
    }
}

impl CookieDocument for HtmlCookies {
    fn cookie(&self) -> String {
        Self::document()
            .and_then(|document| document.cookie().ok())
            .unwrap_or_default()
    }

    fn set_cookie(&self, assignment: &str) {
        if let Some(document) = Self::document() {
            let _ = document.set_cookie(assignment);
        }
    }

    fn is_available(&self) -> bool {
        Self::document().is_some()
    }
}
