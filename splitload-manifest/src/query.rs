//! Render-pass bundle queries

use crate::document::{Manifest, ManifestEntry};
use tracing::warn;

/// Collect the bundle entries behind a render pass's references.
///
/// Entries come back in reference order, concatenated per reference.
/// Duplicates are preserved when references share a bundle; the caller
/// deduplicates if its embedding requires it. References absent from the
/// manifest are skipped.
pub fn get_bundles<'a>(manifest: &'a Manifest, references: &[String]) -> Vec<&'a ManifestEntry> {
    let mut bundles = Vec::new();
    for reference in references {
        match manifest.get(reference) {
            Some(entries) => bundles.extend(entries.iter()),
            None => warn!(reference = reference.as_str(), "reference not in manifest"),
        }
    }
    bundles
}
