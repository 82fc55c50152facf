use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Stash, StashOptions};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct StateInner<T> {
    stash: Stash,
    key: String,
    options: StashOptions,
    value: RwLock<T>,
    subscribers: RwLock<Vec<(usize, Subscriber<T>)>>,
    next_id: AtomicUsize,
}

impl<T> StateInner<T> {
    fn value(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn value_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write().unwrap_or_else(PoisonError::into_inner)
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: usize);
}

impl<T: Send + Sync> Unsubscribe for StateInner<T> {
    fn unsubscribe(&self, id: usize) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(subscriber_id, _)| *subscriber_id != id);
    }
}

/// A state cell bound to one stash entry.
///
/// Created by [`use_stash`]. Reads come from the cell; every change is
/// written through to the stash immediately and then passed to
/// subscribers. Clones share the same cell.
pub struct StashState<T> {
    inner: Arc<StateInner<T>>,
}

impl<T> StashState<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn activate(stash: &Stash, key: String, default: T, options: StashOptions) -> Self {
        let initial = stash.get(&key, &options).unwrap_or(default);
        let state = Self {
            inner: Arc::new(StateInner {
                stash: stash.clone(),
                key,
                options,
                value: RwLock::new(initial),
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicUsize::new(0),
            }),
        };
        // Activation persists the initial value, like any later change.
        state.persist();
        state
    }

    /// The stash key this cell is bound to.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn options(&self) -> &StashOptions {
        &self.inner.options
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value().clone()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value())
    }

    /// Set a new value, write it to the stash and notify subscribers.
    pub fn set(&self, new_value: T) {
        *self.inner.value_mut() = new_value;
        self.changed();
    }

    /// Update the value using a function.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = self.inner.value_mut();
            f(&mut value);
        }
        self.changed();
    }

    /// Re-read the entry from the stash.
    ///
    /// Picks up writes made behind this cell's back. Returns `false` and
    /// keeps the current value when the entry is absent or expired.
    /// Subscribers are notified but nothing is written back.
    pub fn reload(&self) -> bool {
        let Some(stored) = self.inner.stash.get::<T>(&self.inner.key, &self.inner.options) else {
            return false;
        };
        *self.inner.value_mut() = stored;
        self.notify();
        true
    }

    /// Subscribe to changes.
    ///
    /// The callback runs after each change has been written to the stash.
    /// It stops being called once the returned guard is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));

        let owner: Weak<dyn Unsubscribe> = Arc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
        Subscription { id, owner }
    }

    /// Split into read and write halves, like a `[value, setValue]` pair.
    pub fn split(self) -> (ReadState<T>, WriteState<T>) {
        (ReadState(self.clone()), WriteState(self))
    }

    fn changed(&self) {
        self.persist();
        self.notify();
    }

    fn persist(&self) {
        let value = self.inner.value();
        self.inner
            .stash
            .set(&self.inner.key, &*value, &self.inner.options);
    }

    fn notify(&self) {
        // Collect first so callbacks may subscribe or drop guards.
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        let value = self.get();
        for subscriber in subscribers {
            subscriber(&value);
        }
    }
}

impl<T> Clone for StashState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StashState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StashState")
            .field("key", &self.inner.key)
            .field("value", &*self.inner.value())
            .finish()
    }
}

/// Read half of a [`StashState`].
pub struct ReadState<T>(StashState<T>);

impl<T> ReadState<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.subscribe(callback)
    }
}

impl<T> Clone for ReadState<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Write half of a [`StashState`].
pub struct WriteState<T>(StashState<T>);

impl<T> WriteState<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn set(&self, new_value: T) {
        self.0.set(new_value)
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.0.update(f)
    }
}

impl<T> Clone for WriteState<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// RAII guard for state subscribers.
pub struct Subscription {
    id: usize,
    owner: Weak<dyn Unsubscribe>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.unsubscribe(self.id);
        }
    }
}

/// Bind a state cell to the stash entry under `key`.
///
/// The cell starts with the stored value, or `default` when the entry is
/// absent, expired or does not decode as `T`. The starting value is written
/// back at once; after that every `set` or `update` writes through with the
/// same key and options.
///
/// # Example
///
/// ```rust
/// use stash::{use_stash, Stash, StashOptions};
///
/// let stash = Stash::in_memory();
/// let count = use_stash(&stash, "count", 0, StashOptions::local());
/// count.update(|n| *n += 1);
/// assert_eq!(stash.get::<i32>("count", &StashOptions::local()), Some(1));
/// ```
pub fn use_stash<T>(
    stash: &Stash,
    key: impl Into<String>,
    default: T,
    options: StashOptions,
) -> StashState<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    StashState::activate(stash, key.into(), default, options)
}
