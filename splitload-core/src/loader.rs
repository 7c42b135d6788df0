//! Loader types
//!
//! A loader is the unit of deferred work: an async function producing a
//! unit's payload. Loaders are reference counted so registries and cached
//! states can hold and re-invoke them without ownership games.

use crate::error::LoadResult;
use futures_util::future::{try_join_all, BoxFuture};
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Shared async loader producing a unit's payload
pub type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, LoadResult<T>> + Send + Sync>;

/// Build a [`Loader`] from an async closure.
///
/// # Arguments
/// * `f` - Closure returning the load future; invoked once per load attempt
pub fn loader_fn<T, F, Fut>(f: F) -> Loader<T>
where
    T: 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult<T>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// A unit's loading work: one loader, or a named map of loaders.
pub enum LoaderSpec<T> {
    /// A single loader
    Single(Loader<T>),
    /// Named loaders loaded together as one composite unit
    Map(IndexMap<String, Loader<T>>),
}

impl<T> LoaderSpec<T> {
    /// Flatten into the individual loaders, in declaration order
    pub fn flatten(&self) -> Vec<Loader<T>> {
        match self {
            LoaderSpec::Single(loader) => vec![loader.clone()],
            LoaderSpec::Map(map) => map.values().cloned().collect(),
        }
    }

    /// Number of individual loaders in this spec
    pub fn len(&self) -> usize {
        match self {
            LoaderSpec::Single(_) => 1,
            LoaderSpec::Map(map) => map.len(),
        }
    }

    /// True when the spec holds no loaders
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for LoaderSpec<T> {
    fn clone(&self) -> Self {
        match self {
            LoaderSpec::Single(loader) => LoaderSpec::Single(loader.clone()),
            LoaderSpec::Map(map) => LoaderSpec::Map(map.clone()),
        }
    }
}

impl<T> fmt::Debug for LoaderSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderSpec::Single(_) => f.write_str("LoaderSpec::Single"),
            LoaderSpec::Map(map) => write!(f, "LoaderSpec::Map({} loaders)", map.len()),
        }
    }
}

/// Run every loader in the given specs, failing on the first failure.
///
/// Map-shaped specs are flattened into their individual loaders. Payloads
/// come back in spec order.
pub async fn preload_units<T>(specs: &[LoaderSpec<T>]) -> LoadResult<Vec<T>> {
    let futures: Vec<_> = specs
        .iter()
        .flat_map(|spec| spec.flatten())
        .map(|loader| loader())
        .collect();
    try_join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    #[tokio::test]
    async fn loader_fn_runs_closure() {
        let loader = loader_fn(|| async { Ok(7) });
        assert_eq!(loader().await, Ok(7));
        assert_eq!(loader().await, Ok(7));
    }

    #[test]
    fn flatten_preserves_declaration_order() {
        let mut map = IndexMap::new();
        map.insert(String::from("b"), loader_fn(|| async { Ok("b") }));
        map.insert(String::from("a"), loader_fn(|| async { Ok("a") }));
        let spec = LoaderSpec::Map(map);
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.flatten().len(), 2);
    }

    #[tokio::test]
    async fn preload_units_collects_in_spec_order() {
        let mut map = IndexMap::new();
        map.insert(String::from("two"), loader_fn(|| async { Ok(2) }));
        map.insert(String::from("three"), loader_fn(|| async { Ok(3) }));
        let specs = vec![
            LoaderSpec::Single(loader_fn(|| async { Ok(1) })),
            LoaderSpec::Map(map),
        ];

        let payloads = preload_units(&specs).await.unwrap();
        assert_eq!(payloads, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn preload_units_fails_on_first_failure() {
        let specs = vec![
            LoaderSpec::Single(loader_fn(|| async { Ok(1) })),
            LoaderSpec::Single(loader_fn(|| async {
                Err(LoadError::failed("missing chunk"))
            })),
        ];

        let result = preload_units(&specs).await;
        assert_eq!(result, Err(LoadError::failed("missing chunk")));
    }

    #[tokio::test]
    async fn preload_units_empty_is_ok() {
        let specs: Vec<LoaderSpec<i32>> = Vec::new();
        assert_eq!(preload_units(&specs).await, Ok(Vec::new()));
    }
}
