//! Splitload Core
//!
//! Runtime load machinery for code-split units: shared load states that run
//! each loader at most once, composite map units, registries with bulk
//! preloading, synchronous module resolution for render passes, reference
//! tracing, and progress watching with delay and timeout signals.

pub mod error;
pub mod loader;
pub mod map;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod trace;
pub mod unit;
pub mod watch;

pub use error::{LoadError, LoadResult, ResolveError};
pub use loader::{loader_fn, preload_units, Loader, LoaderSpec};
pub use map::{LoadUnitMap, MapOptions, MapState};
pub use registry::{Registry, UnitId};
pub use resolver::{ModuleRef, ModuleResolver, ModuleTable, ReadyFn};
pub use state::{LoadState, SettledFuture, StateHandle, StateView};
pub use trace::ReferenceTrace;
pub use unit::{LoadUnit, UnitOptions};
pub use watch::{LoadSnapshot, LoadWatcher};

// Configuration vocabulary used at this layer.
pub use splitload_config::{ResolutionStrategy, UnitConfig};
