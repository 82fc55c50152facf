//! # Stash
//!
//! One key/value interface over three kinds of client storage.
//!
//! ## Store
//!
//! [`Stash`] routes `set`, `get`, `remove` and `clear` to a backend chosen
//! per call:
//! - `local` - durable storage
//! - `session` - storage scoped to the current session
//! - `cookie` - the cookie jar
//!
//! Values are JSON-encoded together with an optional expiry. Expiry is lazy:
//! an entry read after its expiry is removed and reads as absent.
//!
//! ## Bindings
//!
//! [`use_stash`] binds a state cell to one entry. The cell is filled from the
//! stash when created and written back on every change.
//!
//! ## Backends
//!
//! Host storage is injected through the [`Backend`](backend::Backend) trait.
//! In-memory backends are always available; the `web` feature adds browser
//! storage.

pub mod backend;
pub mod binding;
mod config;
mod error;
pub mod store;
pub mod timestamp;

// Re-export main types for convenience
pub use binding::{use_stash, ReadState, StashState, Subscription, WriteState};
pub use config::StashConfig;
pub use error::{Result, StashError};
pub use store::{Entry, Expiration, Stash, StashOptions, StorageType};
