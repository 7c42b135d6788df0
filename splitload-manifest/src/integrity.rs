//! Sub-resource integrity digests

use crate::error::ManifestError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Compute a sub-resource integrity value for `content`.
///
/// One `<algorithm>-<base64 digest>` token per requested algorithm, joined
/// by single spaces, matching the W3C SRI attribute format.
pub fn integrity_value(content: &str, algorithms: &[String]) -> Result<String, ManifestError> {
    let mut tokens = Vec::with_capacity(algorithms.len());
    for algorithm in algorithms {
        tokens.push(format!("{}-{}", algorithm, digest(content, algorithm)?));
    }
    Ok(tokens.join(" "))
}

fn digest(content: &str, algorithm: &str) -> Result<String, ManifestError> {
    let bytes = match algorithm {
        "sha256" => Sha256::digest(content.as_bytes()).to_vec(),
        "sha384" => Sha384::digest(content.as_bytes()).to_vec(),
        "sha512" => Sha512::digest(content.as_bytes()).to_vec(),
        other => {
            return Err(ManifestError::UnsupportedAlgorithm {
                algorithm: other.to_string(),
            })
        }
    };
    Ok(STANDARD.encode(bytes))
}
