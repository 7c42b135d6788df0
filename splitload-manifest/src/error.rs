//! Error types for manifest building

use crate::output::OutputError;
use thiserror::Error;

/// Error produced while building, serializing, or writing a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A chunk names an output file the compilation has no asset for
    #[error("chunk '{chunk}' references unknown asset '{file}'")]
    UnknownAsset { chunk: String, file: String },

    /// An integrity algorithm is not supported
    #[error("unsupported integrity algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Manifest serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Writing through the output filesystem failed
    #[error("output failed: {0}")]
    Output(#[from] OutputError),
}

impl From<serde_json::Error> for ManifestError {
    fn from(err: serde_json::Error) -> Self {
        ManifestError::Serialization(err.to_string())
    }
}
