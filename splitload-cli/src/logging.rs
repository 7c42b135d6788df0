//! Logging setup for the CLI
//!
//! Structured logs go to stderr so command output on stdout stays
//! machine-readable; an optional JSON file sink captures the same events.

use crate::config::LogConfig;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Parse a format name, `None` when unrecognized
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

fn create_format_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
    }
}

fn target_filter(config: &LogConfig) -> Targets {
    Targets::new()
        .with_default(config.global)
        .with_target("splitload_manifest", config.level_for("splitload_manifest"))
        .with_target("splitload_cli", config.level_for("splitload_cli"))
}

/// Initialize logging to stderr
pub fn init(config: &LogConfig, format: LogFormat) {
    let stderr_layer = create_format_layer(format).with_filter(target_filter(config));
    tracing_subscriber::registry().with(stderr_layer).init();
}

/// Initialize logging to stderr plus a JSON file sink
pub fn init_with_file(config: &LogConfig, format: LogFormat, log_file: Option<&Path>) {
    let Some(path) = log_file else {
        init(config, format);
        return;
    };

    let file = File::create(path).expect("Failed to create log file");
    let stderr_layer = create_format_layer(format).with_filter(target_filter(config));
    let file_layer = fmt::layer()
        .json()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_filter(target_filter(config));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
