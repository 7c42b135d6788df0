//! Manifest document
//!
//! The output side of manifest building: a JSON document mapping each
//! logical reference to the bundle entries that carry it. Field names are
//! camelCase on the wire so render servers in any language read it
//! naturally.

use crate::error::ManifestError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Wire name digests are stored under unless configured otherwise
pub const INTEGRITY_FIELD: &str = "integrity";

/// One bundle entry under a manifest reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Weak numeric module id, `null` when the compilation assigned none
    pub id: Option<i64>,
    /// Stable module name, `null` when the compilation assigned none
    pub name: Option<String>,
    /// Output file name
    pub file: String,
    /// Public URL of the output file
    pub public_path: String,
    /// Sub-resource integrity digest, present when integrity was enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    /// Content hash, when the compilation computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Manifest mapping logical references to bundle entries.
///
/// References keep build order; entries under one reference keep discovery
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, Vec<ManifestEntry>>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under `reference`, creating the reference on first use
    pub fn insert(&mut self, reference: impl Into<String>, entry: ManifestEntry) {
        self.entries.entry(reference.into()).or_default().push(entry);
    }

    /// The entries recorded under `reference`, if any
    pub fn get(&self, reference: &str) -> Option<&[ManifestEntry]> {
        self.entries.get(reference).map(|entries| entries.as_slice())
    }

    /// Iterate references and their entries in build order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ManifestEntry>)> {
        self.entries.iter()
    }

    /// Number of references in the manifest
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the manifest holds no references
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to pretty-printed JSON, storing digests under
    /// `integrity_property`.
    pub fn to_json_pretty(&self, integrity_property: &str) -> Result<String, ManifestError> {
        if integrity_property == INTEGRITY_FIELD {
            return Ok(serde_json::to_string_pretty(self)?);
        }
        let mut value = serde_json::to_value(self)?;
        rename_integrity(&mut value, INTEGRITY_FIELD, integrity_property);
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Parse a manifest whose digests were stored under `integrity_property`.
    pub fn from_json(json: &str, integrity_property: &str) -> Result<Self, ManifestError> {
        if integrity_property == INTEGRITY_FIELD {
            return Ok(serde_json::from_str(json)?);
        }
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        rename_integrity(&mut value, integrity_property, INTEGRITY_FIELD);
        Ok(serde_json::from_value(value)?)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a String, &'a Vec<ManifestEntry>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<ManifestEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Move every entry's digest field from `from` to `to`.
fn rename_integrity(value: &mut serde_json::Value, from: &str, to: &str) {
    let serde_json::Value::Object(references) = value else {
        return;
    };
    for entries in references.values_mut() {
        let serde_json::Value::Array(list) = entries else {
            continue;
        };
        for entry in list {
            if let serde_json::Value::Object(fields) = entry {
                if let Some(digest) = fields.remove(from) {
                    fields.insert(to.to_string(), digest);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file: &str) -> ManifestEntry {
        ManifestEntry {
            id: Some(1),
            name: Some(String::from("main")),
            file: file.to_string(),
            public_path: format!("/assets/{file}"),
            integrity: None,
            hash: None,
        }
    }

    #[test]
    fn insert_appends_under_one_reference() {
        let mut manifest = Manifest::new();
        manifest.insert("./routes/Home", entry("home.js"));
        manifest.insert("./routes/Home", entry("home-styles.js"));

        let entries = manifest.get("./routes/Home").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, "home.js");
        assert_eq!(entries[1].file, "home-styles.js");
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn serializes_camel_case_with_null_identity() {
        let mut manifest = Manifest::new();
        manifest.insert(
            "./routes/Home",
            ManifestEntry {
                id: None,
                name: None,
                file: String::from("home.js"),
                public_path: String::from("/assets/home.js"),
                integrity: None,
                hash: None,
            },
        );

        let json = manifest.to_json_pretty(INTEGRITY_FIELD).unwrap();
        assert!(json.contains(r#""publicPath": "/assets/home.js""#));
        assert!(json.contains(r#""id": null"#));
        assert!(json.contains(r#""name": null"#));
        // Absent digests are omitted entirely.
        assert!(!json.contains("integrity"));
    }

    #[test]
    fn round_trips_through_json() {
        let mut manifest = Manifest::new();
        let mut with_digest = entry("home.js");
        with_digest.integrity = Some(String::from("sha384-AAAA"));
        with_digest.hash = Some(String::from("abc123"));
        manifest.insert("./routes/Home", with_digest);
        manifest.insert("./routes/About", entry("about.js"));

        let json = manifest.to_json_pretty(INTEGRITY_FIELD).unwrap();
        let parsed = Manifest::from_json(&json, INTEGRITY_FIELD).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn custom_integrity_property_renames_on_the_wire() {
        let mut manifest = Manifest::new();
        let mut with_digest = entry("home.js");
        with_digest.integrity = Some(String::from("sha384-AAAA"));
        manifest.insert("./routes/Home", with_digest);

        let json = manifest.to_json_pretty("sri").unwrap();
        assert!(json.contains(r#""sri": "sha384-AAAA""#));
        assert!(!json.contains(r#""integrity""#));

        let parsed = Manifest::from_json(&json, "sri").unwrap();
        assert_eq!(
            parsed.get("./routes/Home").unwrap()[0].integrity,
            Some(String::from("sha384-AAAA"))
        );
    }

    #[test]
    fn preserves_reference_order() {
        let mut manifest = Manifest::new();
        manifest.insert("./z", entry("z.js"));
        manifest.insert("./a", entry("a.js"));

        let references: Vec<_> = manifest.iter().map(|(reference, _)| reference.as_str()).collect();
        assert_eq!(references, vec!["./z", "./a"]);

        let json = manifest.to_json_pretty(INTEGRITY_FIELD).unwrap();
        let z_at = json.find("./z").unwrap();
        let a_at = json.find("./a").unwrap();
        assert!(z_at < a_at);
    }
}
