//! Synchronous module resolution
//!
//! A render pass first tries to resolve a unit's module without running its
//! loader: a pre-rendering server resolves by source path, a live client by
//! weak numeric id. The capability is injected through [`ModuleResolver`] so
//! the core stays agnostic to any particular module runtime.

use crate::error::ResolveError;
use splitload_config::ResolutionStrategy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A weak numeric module id resolvable on the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef(pub i64);

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Readiness predicate returning the weak refs a unit depends on.
///
/// Evaluated each time readiness is checked, because the set of loaded
/// modules grows as chunks arrive.
pub type ReadyFn = Arc<dyn Fn() -> Vec<ModuleRef> + Send + Sync>;

/// Synchronous module resolution capability.
pub trait ModuleResolver<T>: Send + Sync {
    /// Resolve an already-loaded module by source path
    fn resolve_by_path(&self, path: &str) -> Result<T, ResolveError>;

    /// Resolve an already-loaded module by weak id
    fn resolve_by_id(&self, id: ModuleRef) -> Result<T, ResolveError>;

    /// Whether the module behind `id` is currently loaded
    fn is_ready(&self, id: ModuleRef) -> bool;

    /// The strategy this resolver serves
    fn strategy(&self) -> ResolutionStrategy;
}

/// An in-process module table.
///
/// Backs both resolution strategies: source paths for a pre-rendering pass,
/// weak ids for a live client pass. Thread safe; inserts happen as modules
/// finish loading.
pub struct ModuleTable<T> {
    strategy: ResolutionStrategy,
    by_path: RwLock<HashMap<String, T>>,
    by_id: RwLock<HashMap<ModuleRef, T>>,
}

impl<T: Clone> ModuleTable<T> {
    /// Create an empty table serving the given strategy
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            by_path: RwLock::new(HashMap::new()),
            by_id: RwLock::new(HashMap::new()),
        }
    }

    /// Register a loaded module under its source path
    pub fn insert_path(&self, path: impl Into<String>, module: T) {
        let mut modules = match self.by_path.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        modules.insert(path.into(), module);
    }

    /// Register a loaded module under its weak id
    pub fn insert_id(&self, id: ModuleRef, module: T) {
        let mut modules = match self.by_id.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        modules.insert(id, module);
    }

    /// Number of modules registered under either key space
    pub fn len(&self) -> usize {
        let by_path = match self.by_path.read() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        };
        let by_id = match self.by_id.read() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        };
        by_path + by_id
    }

    /// True when no module is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> ModuleResolver<T> for ModuleTable<T>
where
    T: Clone + Send + Sync,
{
    fn resolve_by_path(&self, path: &str) -> Result<T, ResolveError> {
        let modules = self.by_path.read().map_err(|_| ResolveError::TableUnavailable {
            message: String::from("lock poisoned"),
        })?;
        modules.get(path).cloned().ok_or_else(|| ResolveError::PathNotFound {
            path: path.to_string(),
        })
    }

    fn resolve_by_id(&self, id: ModuleRef) -> Result<T, ResolveError> {
        let modules = self.by_id.read().map_err(|_| ResolveError::TableUnavailable {
            message: String::from("lock poisoned"),
        })?;
        modules
            .get(&id)
            .cloned()
            .ok_or(ResolveError::IdNotFound { id: id.0 })
    }

    fn is_ready(&self, id: ModuleRef) -> bool {
        match self.by_id.read() {
            Ok(modules) => modules.contains_key(&id),
            Err(_) => false,
        }
    }

    fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }
}

impl<T> fmt::Debug for ModuleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleTable")
            .field("strategy", &self.strategy)
            .finish()
    }
}
