//! Manifest building
//!
//! Walks a compilation's chunk graph and reconciles it into a manifest:
//! every module of every kept chunk contributes one entry per output file,
//! keyed by the module's canonical request. The written document fully
//! replaces any previous manifest at the same path.

use crate::compilation::{Chunk, Compilation};
use crate::document::{Manifest, ManifestEntry};
use crate::error::ManifestError;
use crate::integrity::integrity_value;
use crate::output::OutputFileSystem;
use regex::Regex;
use splitload_config::ManifestConfig;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

enum IgnorePattern {
    Exact(String),
    Pattern(Regex),
}

impl IgnorePattern {
    /// Compile one configured name as a whole-name pattern, falling back to
    /// an exact comparison when it does not parse as a regular expression.
    fn compile(name: &str) -> Self {
        match Regex::new(&format!("^(?:{name})$")) {
            Ok(pattern) => IgnorePattern::Pattern(pattern),
            Err(_) => IgnorePattern::Exact(name.to_string()),
        }
    }

    fn matches(&self, chunk_name: &str) -> bool {
        match self {
            IgnorePattern::Exact(name) => name == chunk_name,
            IgnorePattern::Pattern(pattern) => pattern.is_match(chunk_name),
        }
    }
}

/// Builds manifest documents from compilation snapshots.
pub struct ManifestBuilder {
    config: ManifestConfig,
    ignore: Vec<IgnorePattern>,
}

impl ManifestBuilder {
    /// Create a builder for the given configuration
    pub fn new(config: ManifestConfig) -> Self {
        let ignore = config
            .ignore_chunk_names
            .iter()
            .map(|name| IgnorePattern::compile(name))
            .collect();
        Self { config, ignore }
    }

    /// Reconcile `compilation` into a manifest document.
    ///
    /// Entries are deduplicated per (request, file) pair, so a module
    /// appearing in several chunks that share an output file contributes one
    /// entry. Fails when a kept chunk names a file the compilation has no
    /// asset for.
    pub fn build(&self, compilation: &Compilation) -> Result<Manifest, ManifestError> {
        let mut manifest = Manifest::new();
        let mut seen: HashMap<String, Vec<String>> = HashMap::new();
        let mut digests: HashMap<String, String> = HashMap::new();

        for chunk in &compilation.chunks {
            if self.is_ignored(chunk) {
                debug!(chunk = chunk.name.as_deref().unwrap_or("<unnamed>"), "chunk ignored");
                continue;
            }

            for file in &chunk.files {
                let asset = compilation.asset(file).ok_or_else(|| {
                    ManifestError::UnknownAsset {
                        chunk: chunk.name.clone().unwrap_or_default(),
                        file: file.clone(),
                    }
                })?;

                let integrity = if self.config.integrity {
                    Some(self.digest_for(&mut digests, file, &asset.content)?)
                } else {
                    None
                };

                for module in &chunk.modules {
                    let request = module.canonical_request();
                    let files_seen = seen.entry(request.to_string()).or_default();
                    if files_seen.iter().any(|seen_file| seen_file == file) {
                        continue;
                    }
                    files_seen.push(file.clone());

                    let identity = module.canonical_identity();
                    manifest.insert(
                        request,
                        ManifestEntry {
                            id: identity.id,
                            name: identity.name.clone(),
                            file: file.clone(),
                            public_path: join_public_path(&compilation.public_path, file),
                            integrity: integrity.clone(),
                            hash: asset.hash.clone(),
                        },
                    );
                }
            }
        }

        info!(
            references = manifest.len(),
            chunks = compilation.chunks.len(),
            "manifest built"
        );
        Ok(manifest)
    }

    /// Build and write the manifest under the configured file name.
    ///
    /// Creates `out_dir` when absent and fully replaces any previous
    /// document. Returns the written manifest.
    pub fn write(
        &self,
        compilation: &Compilation,
        out_dir: &Path,
        output: &dyn OutputFileSystem,
    ) -> Result<Manifest, ManifestError> {
        let manifest = self.build(compilation)?;
        let json = manifest.to_json_pretty(&self.config.integrity_property_name)?;

        output.create_dir_all(out_dir)?;
        let path = out_dir.join(&self.config.filename);
        output.write_file(&path, &json)?;
        info!(path = %path.display(), "manifest written");
        Ok(manifest)
    }

    fn is_ignored(&self, chunk: &Chunk) -> bool {
        let Some(name) = chunk.name.as_deref() else {
            return false;
        };
        self.ignore.iter().any(|pattern| pattern.matches(name))
    }

    /// Digest each file once, however many chunks carry it.
    fn digest_for(
        &self,
        digests: &mut HashMap<String, String>,
        file: &str,
        content: &str,
    ) -> Result<String, ManifestError> {
        if let Some(existing) = digests.get(file) {
            return Ok(existing.clone());
        }
        let digest = integrity_value(content, &self.config.integrity_algorithms)?;
        digests.insert(file.to_string(), digest.clone());
        Ok(digest)
    }
}

/// Join the compilation's public path with an output file name.
fn join_public_path(public_path: &str, file: &str) -> String {
    if public_path.is_empty() {
        return file.to_string();
    }
    if public_path.ends_with('/') {
        format!("{public_path}{file}")
    } else {
        format!("{public_path}/{file}")
    }
}
