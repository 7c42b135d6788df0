//! Compilation snapshot
//!
//! The input side of manifest building: the chunk and module graph a
//! bundling compilation produced, plus the emitted assets. Build pipelines
//! construct it in process or dump it to JSON and feed it to the CLI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a module names itself across build and runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIdentity {
    /// Weak numeric id, when the compilation assigned one
    #[serde(default)]
    pub id: Option<i64>,
    /// Stable name, when the compilation assigned one
    #[serde(default)]
    pub name: Option<String>,
    /// The raw request string the module was imported with
    pub raw_request: String,
}

/// One module inside a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkModule {
    /// The module's own identity
    #[serde(flatten)]
    pub identity: ModuleIdentity,
    /// Identity of the concatenation root, when the module was folded into
    /// a concatenated module by an optimization pass
    #[serde(default)]
    pub concatenation_root: Option<ModuleIdentity>,
}

impl ChunkModule {
    /// The request the manifest keys this module under.
    ///
    /// A concatenated module answers with its concatenation root's request,
    /// so every fragment of the group lands under one key.
    pub fn canonical_request(&self) -> &str {
        match &self.concatenation_root {
            Some(root) => &root.raw_request,
            None => &self.identity.raw_request,
        }
    }

    /// The identity the manifest describes this module with
    pub fn canonical_identity(&self) -> &ModuleIdentity {
        match &self.concatenation_root {
            Some(root) => root,
            None => &self.identity,
        }
    }
}

/// One chunk the compilation produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk's name, when it has one
    #[serde(default)]
    pub name: Option<String>,
    /// Output files this chunk emitted
    pub files: Vec<String>,
    /// Modules contained in this chunk
    pub modules: Vec<ChunkModule>,
}

/// The emitted content of one output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSource {
    /// The file's full content
    pub content: String,
    /// Content hash the compilation computed, if any
    #[serde(default)]
    pub hash: Option<String>,
}

/// A compilation's chunk graph and emitted assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    /// Public URL prefix output files are served under
    #[serde(default)]
    pub public_path: String,
    /// Every chunk the compilation produced
    pub chunks: Vec<Chunk>,
    /// Emitted assets keyed by output file name
    #[serde(default)]
    pub assets: IndexMap<String, AssetSource>,
}

impl Compilation {
    /// Look up an emitted asset by output file name
    pub fn asset(&self, file: &str) -> Option<&AssetSource> {
        self.assets.get(file)
    }
}
