//! Splitload Manifest
//!
//! Build-time reconciliation between a bundling compilation and the render
//! pass: build a manifest mapping logical references to bundle entries,
//! write it through a pluggable output filesystem, and answer render-pass
//! queries for the bundles behind a set of references. A stats-based
//! flushing path covers pipelines that only have a bundler's stats output.

pub mod builder;
pub mod compilation;
pub mod document;
pub mod error;
pub mod integrity;
pub mod output;
pub mod query;
pub mod stats;

pub use builder::ManifestBuilder;
pub use compilation::{AssetSource, Chunk, ChunkModule, Compilation, ModuleIdentity};
pub use document::{Manifest, ManifestEntry, INTEGRITY_FIELD};
pub use error::ManifestError;
pub use integrity::integrity_value;
pub use output::{MemoryOutput, NativeOutput, OutputError, OutputFileSystem};
pub use query::get_bundles;
pub use stats::{
    flush_files_by_id, flush_files_by_path, normalize_source_path, BuildStats, StatsChunk,
    StatsModule,
};

// Configuration vocabulary used at this layer.
pub use splitload_config::ManifestConfig;
