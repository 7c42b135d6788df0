//! Unit registries
//!
//! A registry owns three collections: the start callbacks of every unit
//! constructed against it, the start callbacks of units that declared a
//! readiness predicate, and the arena caching each unit's load state. Bulk
//! preloading drains the callback collections in rounds, so units registered
//! while a round settles are picked up by the next round.

use crate::error::LoadResult;
use futures_util::future::{join_all, try_join_all, BoxFuture};
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// Identity of one registered unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// A unit's start callback, queued for bulk preloading
pub(crate) type Initializer = Box<dyn Fn() -> BoxFuture<'static, LoadResult<()>> + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    all: Mutex<Vec<Initializer>>,
    ready: Mutex<Vec<Initializer>>,
    states: Mutex<HashMap<UnitId, Arc<dyn Any + Send + Sync>>>,
}

/// Registry of deferred units.
///
/// Cloning is cheap and clones share the same collections. A process-wide
/// default is available through [`Registry::global`]; explicit registries
/// keep tests and embedders isolated.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// Clear queued callbacks and cached states.
    ///
    /// Cleared units lose their cached outcome: the next `start` on a unit
    /// runs resolution and its loader again.
    pub fn reset(&self) {
        lock_collection(&self.inner.all).clear();
        lock_collection(&self.inner.ready).clear();
        lock_collection(&self.inner.states).clear();
    }

    /// Number of units holding a cached state
    pub fn cached_states(&self) -> usize {
        lock_collection(&self.inner.states).len()
    }

    /// Number of start callbacks currently queued for [`Registry::preload_all`]
    pub fn queued_initializers(&self) -> usize {
        lock_collection(&self.inner.all).len()
    }

    /// Number of start callbacks currently queued for [`Registry::preload_ready`]
    pub fn queued_ready_initializers(&self) -> usize {
        lock_collection(&self.inner.ready).len()
    }

    /// Load every registered unit, including units registered while earlier
    /// rounds settle, failing on the first loader failure.
    pub async fn preload_all(&self) -> LoadResult<()> {
        let mut rounds = 0usize;
        loop {
            let batch = self.take_batch(&self.inner.all);
            if batch.is_empty() {
                debug!(rounds, "preload complete");
                return Ok(());
            }
            rounds += 1;
            trace!(round = rounds, units = batch.len(), "preload round");
            try_join_all(batch.iter().map(|init| init())).await?;
        }
    }

    /// Load every registered unit whose readiness predicate currently holds.
    ///
    /// Never fails: a unit that is not ready, or whose loader fails, reports
    /// through its own state rather than through this call.
    pub async fn preload_ready(&self) {
        let mut rounds = 0usize;
        loop {
            let batch = self.take_batch(&self.inner.ready);
            if batch.is_empty() {
                debug!(rounds, "ready preload complete");
                return;
            }
            rounds += 1;
            trace!(round = rounds, units = batch.len(), "ready preload round");
            join_all(batch.iter().map(|init| init())).await;
        }
    }

    pub(crate) fn allocate_id(&self) -> UnitId {
        UnitId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn push_initializer(&self, init: Initializer) {
        lock_collection(&self.inner.all).push(init);
    }

    pub(crate) fn push_ready_initializer(&self, init: Initializer) {
        lock_collection(&self.inner.ready).push(init);
    }

    /// Return the cached state for `id`, creating and caching it on first use.
    pub(crate) fn state_or_insert<S>(&self, id: UnitId, create: impl FnOnce() -> S) -> S
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut states = lock_collection(&self.inner.states);
        if let Some(state) = states.get(&id).and_then(|slot| slot.downcast_ref::<S>()) {
            return state.clone();
        }
        let state = create();
        states.insert(id, Arc::new(state.clone()));
        state
    }

    fn take_batch(&self, collection: &Mutex<Vec<Initializer>>) -> Vec<Initializer> {
        std::mem::take(&mut *lock_collection(collection))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("queued", &self.queued_initializers())
            .field("queued_ready", &self.queued_ready_initializers())
            .field("cached_states", &self.cached_states())
            .finish()
    }
}

/// Lock a shared collection, recovering the guard if a holder panicked.
fn lock_collection<T>(collection: &Mutex<T>) -> MutexGuard<'_, T> {
    match collection.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
