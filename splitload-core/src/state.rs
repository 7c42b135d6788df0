//! Shared load state
//!
//! One [`LoadState`] tracks one unit's pending computation. Clones share the
//! same cells, so every consumer observes the same progress and the same
//! outcome. The underlying loader runs when the pending computation is first
//! polled and never again, no matter how many handles exist.

use crate::error::{LoadError, LoadResult};
use crate::loader::Loader;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// The shared settlement future of a load state.
///
/// Completes exactly once; every clone observes the same result.
pub type SettledFuture<T> = Shared<BoxFuture<'static, LoadResult<T>>>;

/// A point-in-time view of a load state
#[derive(Debug, Clone, PartialEq)]
pub struct StateView<T> {
    /// True until the pending computation settles
    pub loading: bool,
    /// The payload, if any; composite states expose partial payloads
    pub value: Option<T>,
    /// The failure, if any
    pub error: Option<LoadError>,
}

/// Uniform access to a unit's load state.
///
/// Implemented by [`LoadState`] for single units and
/// [`MapState`](crate::map::MapState) for composite units, so watchers can
/// treat both alike.
pub trait StateHandle: Clone + Send + Sync + 'static {
    /// The payload type this state produces
    type Output: Clone + Send + Sync + 'static;

    /// True until the pending computation settles
    fn is_loading(&self) -> bool;

    /// The current payload; composite states expose partial payloads while
    /// still loading
    fn current(&self) -> Option<Self::Output>;

    /// The recorded failure, if any
    fn error(&self) -> Option<LoadError>;

    /// The shared settlement future
    fn settled(&self) -> SettledFuture<Self::Output>;
}

/// Shared bookkeeping for one unit's load progress.
pub struct LoadState<T> {
    loading: Arc<AtomicBool>,
    value: Arc<RwLock<Option<T>>>,
    error: Arc<RwLock<Option<LoadError>>>,
    pending: SettledFuture<T>,
}

impl<T> Clone for LoadState<T> {
    fn clone(&self) -> Self {
        Self {
            loading: Arc::clone(&self.loading),
            value: Arc::clone(&self.value),
            error: Arc::clone(&self.error),
            pending: self.pending.clone(),
        }
    }
}

impl<T> LoadState<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a state driving the given loader.
    ///
    /// The loader starts when any consumer first polls the settlement
    /// future; creation alone performs no work.
    pub(crate) fn new(loader: Loader<T>) -> Self {
        let loading = Arc::new(AtomicBool::new(true));
        let value = Arc::new(RwLock::new(None));
        let error = Arc::new(RwLock::new(None));

        let pending = {
            let loading = Arc::clone(&loading);
            let value = Arc::clone(&value);
            let error = Arc::clone(&error);
            async move {
                let result = loader().await;
                match &result {
                    Ok(payload) => write_cell(&value, Some(payload.clone())),
                    Err(err) => write_cell(&error, Some(err.clone())),
                }
                loading.store(false, Ordering::Release);
                result
            }
            .boxed()
            .shared()
        };

        Self {
            loading,
            value,
            error,
            pending,
        }
    }

    /// Create an already-settled state holding `payload`.
    pub(crate) fn resolved(payload: T) -> Self {
        Self {
            loading: Arc::new(AtomicBool::new(false)),
            value: Arc::new(RwLock::new(Some(payload.clone()))),
            error: Arc::new(RwLock::new(None)),
            pending: futures_util::future::ready(Ok(payload)).boxed().shared(),
        }
    }

    /// True until the loader settles
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The payload, if the loader has succeeded
    pub fn value(&self) -> Option<T> {
        read_cell(&self.value)
    }

    /// The failure, if the loader has failed
    pub fn error(&self) -> Option<LoadError> {
        read_cell(&self.error)
    }

    /// Snapshot the loading flag and both cells
    pub fn view(&self) -> StateView<T> {
        StateView {
            loading: self.is_loading(),
            value: self.value(),
            error: self.error(),
        }
    }

    /// The shared settlement future
    pub fn settled(&self) -> SettledFuture<T> {
        self.pending.clone()
    }

    /// Whether two handles share the same underlying state
    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.loading, &other.loading)
    }
}

impl<T> StateHandle for LoadState<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn is_loading(&self) -> bool {
        LoadState::is_loading(self)
    }

    fn current(&self) -> Option<T> {
        self.value()
    }

    fn error(&self) -> Option<LoadError> {
        LoadState::error(self)
    }

    fn settled(&self) -> SettledFuture<T> {
        LoadState::settled(self)
    }
}

impl<T> fmt::Debug for LoadState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_value = match self.value.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        let has_error = match self.error.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        f.debug_struct("LoadState")
            .field("loading", &self.loading.load(Ordering::Acquire))
            .field("has_value", &has_value)
            .field("has_error", &has_error)
            .finish()
    }
}

/// Write a cell, recovering the guard if a previous writer panicked.
pub(crate) fn write_cell<T>(cell: &RwLock<Option<T>>, content: Option<T>) {
    let mut guard = match cell.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = content;
}

/// Read a cell, recovering the guard if a previous writer panicked.
pub(crate) fn read_cell<T: Clone>(cell: &RwLock<Option<T>>) -> Option<T> {
    let guard = match cell.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.clone()
}
