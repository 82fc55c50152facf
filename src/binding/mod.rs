//! Reactive bindings over the stash.
//!
//! A binding reads its entry once when created and writes it back on every
//! change. There is no batching and no cross-context synchronization.

mod state;

pub use state::{use_stash, ReadState, StashState, Subscription, WriteState};
