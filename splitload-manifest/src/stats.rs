//! Build-stats flushing
//!
//! A lighter manifest sibling for pipelines that only have a bundler's
//! stats output: map chunk ids or source paths to the output files a
//! render pass must flush, without content or integrity data.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One chunk in a stats dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsChunk {
    /// Numeric chunk id
    pub id: i64,
    /// Output files the chunk emitted
    pub files: Vec<String>,
}

/// One module in a stats dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsModule {
    /// Module id; stats dumps use strings for server-side module ids
    pub id: String,
    /// Source path of the module
    pub name: String,
    /// Ids of the chunks containing this module
    pub chunks: Vec<i64>,
}

/// A bundler's stats output, reduced to what flushing needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Public URL prefix output files are served under
    #[serde(default)]
    pub public_path: String,
    /// Every chunk in the build
    pub chunks: Vec<StatsChunk>,
    /// Every module in the build
    pub modules: Vec<StatsModule>,
}

impl BuildStats {
    /// Output files per module source path.
    ///
    /// Each module collects the files of every chunk containing it; chunk
    /// ids with no chunk record are tolerated and contribute nothing.
    pub fn files_by_path(&self) -> IndexMap<String, Vec<String>> {
        let files_by_chunk: IndexMap<i64, &[String]> = self
            .chunks
            .iter()
            .map(|chunk| (chunk.id, chunk.files.as_slice()))
            .collect();

        let mut by_path = IndexMap::new();
        for module in &self.modules {
            let mut files = Vec::new();
            for chunk_id in &module.chunks {
                if let Some(chunk_files) = files_by_chunk.get(chunk_id) {
                    files.extend(chunk_files.iter().cloned());
                }
            }
            by_path.insert(module.name.clone(), unique(files));
        }
        by_path
    }

    /// Output files per module id
    pub fn files_by_module_id(&self) -> IndexMap<String, Vec<String>> {
        let by_path = self.files_by_path();
        self.modules
            .iter()
            .map(|module| {
                let files = by_path.get(&module.name).cloned().unwrap_or_default();
                (module.id.clone(), files)
            })
            .collect()
    }
}

/// Output files to flush for modules identified by source path.
///
/// Paths are normalized against `root_dir` before lookup, the way module
/// names appear in stats dumps. The result keeps first-seen order and holds
/// each file once across all requested modules.
pub fn flush_files_by_path(paths: &[String], stats: &BuildStats, root_dir: &str) -> Vec<String> {
    let by_path = stats.files_by_path();
    let mut files = Vec::new();
    for path in paths {
        let normalized = normalize_source_path(path, root_dir);
        if let Some(module_files) = by_path.get(&normalized) {
            files.extend(module_files.iter().cloned());
        }
    }
    unique(files)
}

/// Output files to flush for modules identified by id.
pub fn flush_files_by_id(ids: &[String], stats: &BuildStats) -> Vec<String> {
    let by_id = stats.files_by_module_id();
    let mut files = Vec::new();
    for id in ids {
        if let Some(module_files) = by_id.get(id) {
            files.extend(module_files.iter().cloned());
        }
    }
    unique(files)
}

/// Rewrite an absolute source path the way stats dumps record module names:
/// the build root becomes `.` and a `.js` extension is made explicit.
pub fn normalize_source_path(path: &str, root_dir: &str) -> String {
    let replaced = path.replacen(root_dir, ".", 1);
    let stem = replaced.strip_suffix(".js").unwrap_or(&replaced);
    format!("{stem}.js")
}

fn unique(files: Vec<String>) -> Vec<String> {
    let mut seen = IndexSet::new();
    for file in files {
        seen.insert(file);
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> BuildStats {
        BuildStats {
            public_path: String::from("/assets/"),
            chunks: vec![
                StatsChunk {
                    id: 0,
                    files: vec![String::from("main.js"), String::from("main.css")],
                },
                StatsChunk {
                    id: 1,
                    files: vec![String::from("about.js")],
                },
            ],
            modules: vec![
                StatsModule {
                    id: String::from("./app.js"),
                    name: String::from("./app.js"),
                    chunks: vec![0],
                },
                StatsModule {
                    id: String::from("./routes/About.js"),
                    name: String::from("./routes/About.js"),
                    chunks: vec![0, 1],
                },
            ],
        }
    }

    #[test]
    fn files_by_path_collects_every_chunk() {
        let by_path = sample_stats().files_by_path();
        assert_eq!(
            by_path.get("./routes/About.js").unwrap(),
            &vec!["main.js", "main.css", "about.js"]
        );
    }

    #[test]
    fn missing_chunk_ids_are_tolerated() {
        let mut stats = sample_stats();
        stats.modules.push(StatsModule {
            id: String::from("./orphan.js"),
            name: String::from("./orphan.js"),
            chunks: vec![99],
        });

        let by_path = stats.files_by_path();
        assert_eq!(by_path.get("./orphan.js").unwrap(), &Vec::<String>::new());
    }

    #[test]
    fn per_module_files_are_unique() {
        let stats = BuildStats {
            public_path: String::new(),
            chunks: vec![
                StatsChunk {
                    id: 0,
                    files: vec![String::from("shared.js")],
                },
                StatsChunk {
                    id: 1,
                    files: vec![String::from("shared.js")],
                },
            ],
            modules: vec![StatsModule {
                id: String::from("./m.js"),
                name: String::from("./m.js"),
                chunks: vec![0, 1],
            }],
        };

        let by_path = stats.files_by_path();
        assert_eq!(by_path.get("./m.js").unwrap(), &vec!["shared.js"]);
    }

    #[test]
    fn files_by_module_id_mirrors_paths() {
        let by_id = sample_stats().files_by_module_id();
        assert_eq!(by_id.get("./app.js").unwrap(), &vec!["main.js", "main.css"]);
    }

    #[test]
    fn normalizes_root_and_extension() {
        assert_eq!(
            normalize_source_path("/srv/app/routes/About.js", "/srv/app"),
            "./routes/About.js"
        );
        // Extension is added when absent.
        assert_eq!(
            normalize_source_path("/srv/app/routes/About", "/srv/app"),
            "./routes/About.js"
        );
        // Only the first occurrence of the root is replaced.
        assert_eq!(
            normalize_source_path("/srv/app/vendor/srv/app.js", "/srv/app"),
            "./vendor/srv/app.js"
        );
    }

    #[test]
    fn flush_by_path_normalizes_and_dedupes() {
        let stats = sample_stats();
        let paths = vec![
            String::from("/srv/app/app.js"),
            String::from("/srv/app/routes/About"),
        ];

        let files = flush_files_by_path(&paths, &stats, "/srv/app");
        assert_eq!(files, vec!["main.js", "main.css", "about.js"]);
    }

    #[test]
    fn flush_by_id_dedupes_across_modules() {
        let stats = sample_stats();
        let ids = vec![
            String::from("./app.js"),
            String::from("./routes/About.js"),
        ];

        let files = flush_files_by_id(&ids, &stats);
        assert_eq!(files, vec!["main.js", "main.css", "about.js"]);
    }

    #[test]
    fn unknown_flush_targets_contribute_nothing() {
        let stats = sample_stats();
        let files = flush_files_by_id(&[String::from("./ghost.js")], &stats);
        assert!(files.is_empty());
    }
}
