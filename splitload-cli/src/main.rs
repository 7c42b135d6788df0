//! Splitload CLI
//!
//! Two commands around the manifest layer: `emit` reconciles a compilation
//! dump into a manifest file, `bundles` answers a render pass's query
//! against an existing manifest.

use clap::{Parser, Subcommand};
use splitload_config::ManifestConfig;
use splitload_manifest::{get_bundles, Compilation, Manifest, ManifestBuilder, NativeOutput};
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;

use config::{parse_level, LogConfig};
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "splitload", version, about = "Build and query code-split bundle manifests")]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log level override for the manifest crate
    #[arg(long, global = true)]
    manifest_log_level: Option<String>,

    /// Log format: pretty, compact, json
    #[arg(long, default_value = "compact", global = true)]
    log_format: String,

    /// Also write logs to this file as JSON
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a manifest from a compilation dump
    Emit {
        /// Compilation dump (JSON)
        compilation: PathBuf,

        /// Directory the manifest is written into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Manifest configuration file (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Compute integrity digests even when the configuration disables them
        #[arg(long)]
        integrity: bool,
    },
    /// List the bundle entries behind a render pass's references
    Bundles {
        /// Manifest file to query
        manifest: PathBuf,

        /// References in trace order
        #[arg(value_name = "REFERENCE", required = true)]
        references: Vec<String>,

        /// Manifest property name digests were stored under
        #[arg(long, default_value = "integrity")]
        integrity_property: String,

        /// Print full entries as a JSON array instead of public paths
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_config = build_log_config(&cli);
    let format = LogFormat::parse(&cli.log_format).unwrap_or(LogFormat::Compact);
    logging::init_with_file(&log_config, format, cli.log_file.as_deref());

    let result = match cli.command {
        Command::Emit {
            compilation,
            out_dir,
            config,
            integrity,
        } => run_emit(&compilation, &out_dir, config.as_deref(), integrity),
        Command::Bundles {
            manifest,
            references,
            integrity_property,
            json,
        } => run_bundles(&manifest, &references, &integrity_property, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn build_log_config(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default();
    if let Some(level) = parse_level(&cli.log_level) {
        config.global = level;
    }
    config.manifest = cli.manifest_log_level.as_deref().and_then(parse_level);
    config
}

fn run_emit(
    compilation_path: &Path,
    out_dir: &Path,
    config_path: Option<&Path>,
    force_integrity: bool,
) -> Result<(), String> {
    let compilation = read_compilation(compilation_path)?;
    let mut config = match config_path {
        Some(path) => read_manifest_config(path)?,
        None => ManifestConfig::default(),
    };
    if force_integrity {
        config.integrity = true;
    }

    let filename = config.filename.clone();
    let builder = ManifestBuilder::new(config);
    let manifest = builder
        .write(&compilation, out_dir, &NativeOutput::new())
        .map_err(|e| format!("cannot write manifest: {}", e))?;

    println!(
        "{} references -> {}",
        manifest.len(),
        out_dir.join(filename).display()
    );
    Ok(())
}

fn run_bundles(
    manifest_path: &Path,
    references: &[String],
    integrity_property: &str,
    json: bool,
) -> Result<(), String> {
    let content = std::fs::read_to_string(manifest_path)
        .map_err(|e| format!("cannot read {}: {}", manifest_path.display(), e))?;
    let manifest = Manifest::from_json(&content, integrity_property)
        .map_err(|e| format!("cannot parse {}: {}", manifest_path.display(), e))?;

    let bundles = get_bundles(&manifest, references);
    if json {
        let rendered =
            serde_json::to_string_pretty(&bundles).map_err(|e| format!("cannot render: {}", e))?;
        println!("{}", rendered);
    } else {
        for bundle in bundles {
            println!("{}", bundle.public_path);
        }
    }
    Ok(())
}

fn read_compilation(path: &Path) -> Result<Compilation, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
}

fn read_manifest_config(path: &Path) -> Result<ManifestConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
}
