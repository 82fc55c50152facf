//! The unified store.
//!
//! [`Stash`] routes each operation to the backend named in its options and
//! wraps values in an [`Entry`] envelope carrying an optional expiry.

mod entry;
mod options;
mod stash;

pub use entry::Entry;
pub use options::{Expiration, StashOptions, StorageType};
pub use stash::Stash;
