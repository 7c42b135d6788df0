//! Composite map units
//!
//! A map unit loads several named loaders as one unit. The composite settles
//! only after every inner loader settles, exposes partially filled payloads
//! while loading, and keeps the last failure written as the composite
//! failure.

use crate::error::{LoadError, LoadResult};
use crate::loader::{Loader, LoaderSpec};
use crate::registry::{Registry, UnitId};
use crate::state::{read_cell, write_cell, SettledFuture, StateHandle, StateView};
use crate::trace::ReferenceTrace;
use crate::watch::LoadWatcher;
use futures_util::future::{join_all, FutureExt};
use indexmap::IndexMap;
use splitload_config::UnitConfig;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Shared bookkeeping for one composite unit's progress.
///
/// `values` fills per key as inner loaders succeed, in settlement order.
pub struct MapState<T> {
    loading: Arc<AtomicBool>,
    values: Arc<RwLock<IndexMap<String, T>>>,
    error: Arc<RwLock<Option<LoadError>>>,
    pending: SettledFuture<IndexMap<String, T>>,
}

impl<T> Clone for MapState<T> {
    fn clone(&self) -> Self {
        Self {
            loading: Arc::clone(&self.loading),
            values: Arc::clone(&self.values),
            error: Arc::clone(&self.error),
            pending: self.pending.clone(),
        }
    }
}

impl<T> MapState<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(loaders: IndexMap<String, Loader<T>>) -> Self {
        let loading = Arc::new(AtomicBool::new(true));
        let values = Arc::new(RwLock::new(IndexMap::new()));
        let error = Arc::new(RwLock::new(None));

        let pending = {
            let loading = Arc::clone(&loading);
            let values = Arc::clone(&values);
            let error = Arc::clone(&error);
            async move {
                let entries: Vec<_> = loaders
                    .iter()
                    .map(|(key, loader)| {
                        let key = key.clone();
                        let inner = loader();
                        let values = Arc::clone(&values);
                        let error = Arc::clone(&error);
                        async move {
                            match inner.await {
                                Ok(payload) => {
                                    let mut slot = match values.write() {
                                        Ok(guard) => guard,
                                        Err(poisoned) => poisoned.into_inner(),
                                    };
                                    slot.insert(key, payload);
                                }
                                Err(err) => write_cell(&error, Some(err)),
                            }
                        }
                    })
                    .collect();

                join_all(entries).await;
                loading.store(false, Ordering::Release);

                match read_cell(&error) {
                    Some(err) => Err(err),
                    None => {
                        let settled = match values.read() {
                            Ok(guard) => guard.clone(),
                            Err(poisoned) => poisoned.into_inner().clone(),
                        };
                        Ok(settled)
                    }
                }
            }
            .boxed()
            .shared()
        };

        Self {
            loading,
            values,
            error,
            pending,
        }
    }

    /// True until every inner loader settles
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The payloads loaded so far, keyed by loader name
    pub fn values(&self) -> IndexMap<String, T> {
        match self.values.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The last failure written by an inner loader, if any
    pub fn error(&self) -> Option<LoadError> {
        read_cell(&self.error)
    }

    /// Snapshot the loading flag and both cells
    pub fn view(&self) -> StateView<IndexMap<String, T>> {
        StateView {
            loading: self.is_loading(),
            value: Some(self.values()),
            error: self.error(),
        }
    }

    /// The shared settlement future
    pub fn settled(&self) -> SettledFuture<IndexMap<String, T>> {
        self.pending.clone()
    }

    /// Whether two handles share the same underlying state
    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.loading, &other.loading)
    }
}

impl<T> StateHandle for MapState<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = IndexMap<String, T>;

    fn is_loading(&self) -> bool {
        MapState::is_loading(self)
    }

    fn current(&self) -> Option<IndexMap<String, T>> {
        Some(self.values())
    }

    fn error(&self) -> Option<LoadError> {
        MapState::error(self)
    }

    fn settled(&self) -> SettledFuture<IndexMap<String, T>> {
        MapState::settled(self)
    }
}

impl<T> fmt::Debug for MapState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = match self.values.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        let has_error = match self.error.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        };
        f.debug_struct("MapState")
            .field("loading", &self.loading.load(Ordering::Acquire))
            .field("filled", &filled)
            .field("has_error", &has_error)
            .finish()
    }
}

/// Options for constructing a [`LoadUnitMap`].
pub struct MapOptions<T> {
    loaders: IndexMap<String, Loader<T>>,
    config: UnitConfig,
    references: Vec<String>,
}

impl<T> MapOptions<T> {
    /// Create empty options
    pub fn new() -> Self {
        Self {
            loaders: IndexMap::new(),
            config: UnitConfig::default(),
            references: Vec::new(),
        }
    }

    /// Add one named loader
    pub fn loader(mut self, name: impl Into<String>, loader: Loader<T>) -> Self {
        self.loaders.insert(name.into(), loader);
        self
    }

    /// Replace the signal timing configuration
    pub fn config(mut self, config: UnitConfig) -> Self {
        self.config = config;
        self
    }

    /// Logical references this unit touches, reported into render traces
    pub fn references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }
}

impl<T> Default for MapOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A composite unit loading several named loaders together.
///
/// Shares the single-unit lifecycle: registration at construction,
/// at-most-once loading through the registry arena, watchers with the same
/// delay and timeout signals.
pub struct LoadUnitMap<T> {
    id: UnitId,
    registry: Registry,
    loaders: IndexMap<String, Loader<T>>,
    config: UnitConfig,
    references: Vec<String>,
}

impl<T> Clone for LoadUnitMap<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            registry: self.registry.clone(),
            loaders: self.loaders.clone(),
            config: self.config.clone(),
            references: self.references.clone(),
        }
    }
}

impl<T> LoadUnitMap<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Register a new composite unit in `registry`.
    pub fn new(registry: &Registry, options: MapOptions<T>) -> Self {
        let unit = Self {
            id: registry.allocate_id(),
            registry: registry.clone(),
            loaders: options.loaders,
            config: options.config,
            references: options.references,
        };

        registry.push_initializer({
            let unit = unit.clone();
            Box::new(move || {
                let unit = unit.clone();
                Box::pin(async move { unit.preload().await })
            })
        });

        unit
    }

    /// This unit's registry identity
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Begin loading all inner loaders, or return the cached state
    pub fn start(&self) -> MapState<T> {
        self.registry.state_or_insert(self.id, || {
            debug!(unit = %self.id, loaders = self.loaders.len(), "starting composite");
            MapState::new(self.loaders.clone())
        })
    }

    /// Load every inner loader to completion, warming the cached state
    pub async fn preload(&self) -> LoadResult<()> {
        self.start().settled().await.map(|_| ())
    }

    /// Subscribe to load progress snapshots
    pub fn watch(&self) -> LoadWatcher<MapState<T>> {
        LoadWatcher::new(self.start(), self.config.delay(), self.config.timeout())
    }

    /// Record this unit's declared references into a render-pass trace
    pub fn report(&self, trace: &ReferenceTrace) {
        for reference in &self.references {
            trace.record(reference);
        }
    }

    /// The unit's loading work, usable with [`preload_units`](crate::loader::preload_units)
    pub fn loader_spec(&self) -> LoaderSpec<T> {
        LoaderSpec::Map(self.loaders.clone())
    }

    /// The logical references this unit touches
    pub fn references(&self) -> &[String] {
        &self.references
    }
}
