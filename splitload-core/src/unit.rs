//! Deferred load units

use crate::error::LoadResult;
use crate::loader::{Loader, LoaderSpec};
use crate::registry::{Registry, UnitId};
use crate::resolver::{ModuleRef, ModuleResolver, ReadyFn};
use crate::state::LoadState;
use crate::trace::ReferenceTrace;
use crate::watch::LoadWatcher;
use splitload_config::{ResolutionStrategy, UnitConfig};
use std::sync::Arc;
use tracing::debug;

/// Options for constructing a [`LoadUnit`].
pub struct UnitOptions<T> {
    loader: Loader<T>,
    config: UnitConfig,
    server_path: Option<String>,
    ready_refs: Option<ReadyFn>,
    references: Vec<String>,
    resolver: Option<Arc<dyn ModuleResolver<T>>>,
}

impl<T> UnitOptions<T> {
    /// Create options around the given loader
    pub fn new(loader: Loader<T>) -> Self {
        Self {
            loader,
            config: UnitConfig::default(),
            server_path: None,
            ready_refs: None,
            references: Vec::new(),
            resolver: None,
        }
    }

    /// Replace the signal timing configuration
    pub fn config(mut self, config: UnitConfig) -> Self {
        self.config = config;
        self
    }

    /// Source path used for synchronous resolution on a pre-rendering server
    pub fn server_path(mut self, path: impl Into<String>) -> Self {
        self.server_path = Some(path.into());
        self
    }

    /// Readiness predicate returning the weak refs this unit depends on.
    ///
    /// Units with a predicate participate in ready preloading, and a live
    /// client uses the first returned ref for synchronous resolution.
    pub fn ready<F>(mut self, ready: F) -> Self
    where
        F: Fn() -> Vec<ModuleRef> + Send + Sync + 'static,
    {
        self.ready_refs = Some(Arc::new(ready));
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

    /// Inject the synchronous module resolution capability
    pub fn resolver(mut self, resolver: Arc<dyn ModuleResolver<T>>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// A deferred unit of code behind an async loader.
///
/// Construction registers the unit with its registry. Loading starts on the
/// first `start`, `preload`, or watcher poll, runs at most once, and caches
/// its outcome in the registry arena, failures included.
pub struct LoadUnit<T> {
    id: UnitId,
    registry: Registry,
    loader: Loader<T>,
    config: UnitConfig,
    server_path: Option<String>,
    ready_refs: Option<ReadyFn>,
    references: Vec<String>,
    resolver: Option<Arc<dyn ModuleResolver<T>>>,
}

impl<T> Clone for LoadUnit<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            registry: self.registry.clone(),
            loader: self.loader.clone(),
            config: self.config.clone(),
            server_path: self.server_path.clone(),
            ready_refs: self.ready_refs.clone(),
            references: self.references.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<T> LoadUnit<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Register a new unit in `registry`.
    pub fn new(registry: &Registry, options: UnitOptions<T>) -> Self {
        let unit = Self {
            id: registry.allocate_id(),
            registry: registry.clone(),
            loader: options.loader,
            config: options.config,
            server_path: options.server_path,
            ready_refs: options.ready_refs,
            references: options.references,
            resolver: options.resolver,
        };

        registry.push_initializer({
            let unit = unit.clone();
            Box::new(move || {
                let unit = unit.clone();
                Box::pin(async move { unit.preload().await })
            })
        });

        if unit.ready_refs.is_some() {
            registry.push_ready_initializer({
                let unit = unit.clone();
                Box::new(move || {
                    let unit = unit.clone();
                    Box::pin(async move {
                        if unit.is_ready() {
                            unit.preload().await
                        } else {
                            Ok(())
                        }
                    })
                })
            });
        }

        unit
    }

    /// This unit's registry identity
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Begin loading, or return the cached state.
    ///
    /// The first call tries synchronous resolution through the injected
    /// resolver and falls back to the loader. Later calls return the same
    /// state without re-invoking anything, including after a failure.
    pub fn start(&self) -> LoadState<T> {
        self.registry.state_or_insert(self.id, || self.create_state())
    }

    /// Load to completion, warming the cached state
    pub async fn preload(&self) -> LoadResult<()> {
        self.start().settled().await.map(|_| ())
    }

    /// Subscribe to load progress snapshots
    pub fn watch(&self) -> LoadWatcher<LoadState<T>> {
        LoadWatcher::new(self.start(), self.config.delay(), self.config.timeout())
    }

    /// Record this unit's declared references into a render-pass trace
    pub fn report(&self, trace: &ReferenceTrace) {
        for reference in &self.references {
            trace.record(reference);
        }
    }

    /// Whether every weak ref this unit depends on is currently resolvable
    pub fn is_ready(&self) -> bool {
        let (Some(ready), Some(resolver)) = (self.ready_refs.as_ref(), self.resolver.as_ref())
        else {
            return false;
        };
        let refs = ready();
        !refs.is_empty() && refs.iter().all(|id| resolver.is_ready(*id))
    }

    /// The unit's loading work, usable with [`preload_units`](crate::loader::preload_units)
    pub fn loader_spec(&self) -> LoaderSpec<T> {
        LoaderSpec::Single(self.loader.clone())
    }

    /// The logical references this unit touches
    pub fn references(&self) -> &[String] {
        &self.references
    }

    fn create_state(&self) -> LoadState<T> {
        if let Some(payload) = self.try_resolve_sync() {
            debug!(unit = %self.id, "resolved synchronously");
            return LoadState::resolved(payload);
        }
        debug!(unit = %self.id, "starting loader");
        LoadState::new(self.loader.clone())
    }

    fn try_resolve_sync(&self) -> Option<T> {
        let resolver = self.resolver.as_ref()?;
        match resolver.strategy() {
            ResolutionStrategy::ServerPath => {
                let path = self.server_path.as_deref()?;
                resolver.resolve_by_path(path).ok()
            }
            ResolutionStrategy::ClientId => {
                let refs = (self.ready_refs.as_ref()?)();
                if refs.is_empty() || !refs.iter().all(|id| resolver.is_ready(*id)) {
                    return None;
                }
                resolver.resolve_by_id(refs[0]).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::loader_fn;
    use crate::resolver::ModuleTable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(counter: Arc<AtomicUsize>, payload: &'static str) -> Loader<&'static str> {
        loader_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(payload)
            }
        })
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "home")),
        );

        let first = unit.start();
        let second = unit.start();
        assert!(first.is_same(&second));

        first.settled().await.unwrap();
        second.settled().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_cached_and_not_retried() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let unit: LoadUnit<&str> = LoadUnit::new(&registry, {
            let counter = Arc::clone(&counter);
            UnitOptions::new(loader_fn(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(LoadError::failed("fetch"))
                }
            }))
        });

        assert_eq!(unit.preload().await, Err(LoadError::failed("fetch")));
        assert_eq!(unit.preload().await, Err(LoadError::failed("fetch")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(unit.start().error(), Some(LoadError::failed("fetch")));
    }

    #[tokio::test]
    async fn reset_allows_a_fresh_attempt() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "again")),
        );

        unit.preload().await.unwrap();
        registry.reset();
        unit.preload().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn server_path_resolution_skips_the_loader() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let table = Arc::new(ModuleTable::new(ResolutionStrategy::ServerPath));
        table.insert_path("./routes/Home", "home-module");

        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "loader-module"))
                .server_path("./routes/Home")
                .resolver(table),
        );

        let state = unit.start();
        assert!(!state.is_loading());
        assert_eq!(state.value(), Some("home-module"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_server_module_falls_back_to_the_loader() {
        let registry = Registry::new();
        let table: Arc<ModuleTable<&str>> =
            Arc::new(ModuleTable::new(ResolutionStrategy::ServerPath));

        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(loader_fn(|| async { Ok("from-loader") }))
                .server_path("./routes/Gone")
                .resolver(table),
        );

        let state = unit.start();
        assert!(state.is_loading());
        assert_eq!(state.settled().await, Ok("from-loader"));
    }

    #[tokio::test]
    async fn client_id_resolution_requires_every_ref_ready() {
        let registry = Registry::new();
        let table = Arc::new(ModuleTable::new(ResolutionStrategy::ClientId));
        table.insert_id(ModuleRef(1), "one");

        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(loader_fn(|| async { Ok("from-loader") }))
                .ready(|| vec![ModuleRef(1), ModuleRef(2)])
                .resolver(Arc::clone(&table) as Arc<dyn ModuleResolver<&str>>),
        );
        assert!(!unit.is_ready());
        let state = unit.start();
        assert!(state.is_loading());
        state.settled().await.unwrap();

        registry.reset();
        table.insert_id(ModuleRef(2), "two");
        assert!(unit.is_ready());
        let state = unit.start();
        assert!(!state.is_loading());
        assert_eq!(state.value(), Some("one"));
    }

    #[tokio::test]
    async fn registration_queues_initializers() {
        let registry = Registry::new();
        let _plain: LoadUnit<&str> =
            LoadUnit::new(&registry, UnitOptions::new(loader_fn(|| async { Ok("a") })));
        let _with_ready: LoadUnit<&str> = LoadUnit::new(
            &registry,
            UnitOptions::new(loader_fn(|| async { Ok("b") })).ready(Vec::new),
        );

        assert_eq!(registry.queued_initializers(), 2);
        assert_eq!(registry.queued_ready_initializers(), 1);
    }

    #[tokio::test]
    async fn preload_all_loads_registered_units() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "eager")),
        );

        registry.preload_all().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!unit.start().is_loading());
        assert_eq!(unit.start().value(), Some("eager"));
    }

    #[tokio::test]
    async fn preload_ready_skips_units_that_are_not_ready() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let table = Arc::new(ModuleTable::new(ResolutionStrategy::ClientId));
        table.insert_id(ModuleRef(10), "ten");

        let ready_unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "ready"))
                .ready(|| vec![ModuleRef(10)])
                .resolver(Arc::clone(&table) as Arc<dyn ModuleResolver<&str>>),
        );
        let waiting_unit = LoadUnit::new(
            &registry,
            UnitOptions::new(counting_loader(Arc::clone(&counter), "waiting"))
                .ready(|| vec![ModuleRef(11)])
                .resolver(Arc::clone(&table) as Arc<dyn ModuleResolver<&str>>),
        );

        registry.preload_ready().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!ready_unit.start().is_loading());
        assert_eq!(ready_unit.start().value(), Some("ten"));
        assert!(waiting_unit.start().is_loading());
    }

    #[test]
    fn report_records_references_in_order() {
        let registry = Registry::new();
        let unit: LoadUnit<&str> = LoadUnit::new(
            &registry,
            UnitOptions::new(loader_fn(|| async { Ok("x") }))
                .references(["./routes/Home", "./routes/shared"]),
        );

        let trace = ReferenceTrace::new();
        unit.report(&trace);
        assert_eq!(trace.flush(), vec!["./routes/Home", "./routes/shared"]);
        assert_eq!(unit.references(), ["./routes/Home", "./routes/shared"]);
    }
}
