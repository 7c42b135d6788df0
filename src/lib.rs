//! Splitload
//!
//! Deferred loading for code-split applications, in two halves that meet at
//! the manifest:
//!
//! - the runtime half registers [`LoadUnit`]s whose loaders run at most
//!   once, watches their progress with delay and timeout signals, preloads
//!   them in bulk, and records which references a render pass touched;
//! - the build half reconciles a compilation's chunk graph into a
//!   [`Manifest`] and answers the render pass's [`get_bundles`] query with
//!   the bundle entries those references need.
//!
//! This crate is a facade re-exporting the member crates; depend on the
//! members directly when only one half is needed.

pub use splitload_config::{ManifestConfig, ResolutionStrategy, UnitConfig};

pub use splitload_core::{
    loader_fn, preload_units, LoadError, LoadResult, LoadSnapshot, LoadState, LoadUnit,
    LoadUnitMap, LoadWatcher, Loader, LoaderSpec, MapOptions, MapState, ModuleRef, ModuleResolver,
    ModuleTable, ReadyFn, ReferenceTrace, Registry, ResolveError, SettledFuture, StateHandle,
    StateView, UnitId, UnitOptions,
};

pub use splitload_manifest::{
    flush_files_by_id, flush_files_by_path, get_bundles, integrity_value, normalize_source_path,
    AssetSource, BuildStats, Chunk, ChunkModule, Compilation, Manifest, ManifestBuilder,
    ManifestEntry, ManifestError, MemoryOutput, ModuleIdentity, NativeOutput, OutputError,
    OutputFileSystem, StatsChunk, StatsModule, INTEGRITY_FIELD,
};
