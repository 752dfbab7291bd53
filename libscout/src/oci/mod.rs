//! Manifest documents returned by `/v2/<name>/manifests/<reference>`.
//!
//! Only the fields needed to size a tag are modelled. Unknown fields are
//! ignored so that Docker v2 and OCI documents decode with the same types.

use crate::error::{Result, ScoutError};
use serde::Deserialize;


/// Media types sent in the `Accept` header of manifest requests.
pub const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

/// A content descriptor: a layer, a config blob or a child manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub size: u64,
}

/// A single-platform image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub config: Option<Descriptor>,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// A multi-platform image index (or Docker manifest list).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

/// Either kind of manifest document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestDocument {
    Manifest(ImageManifest),
    Index(ImageIndex),
}

impl ManifestDocument {
    /// Parses manifest bytes, detecting whether they hold a manifest or an index.
    ///
    /// The `mediaType` field decides when present; otherwise a `manifests`
    /// array means an index and anything else is read as a manifest.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::oci::ManifestDocument;
    ///
    /// let body = br#"{"schemaVersion":2,"layers":[{"digest":"sha256:a","size":100}]}"#;
    /// let doc = ManifestDocument::from_bytes(body).unwrap();
    /// assert_eq!(doc.total_size(), 100);
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| ScoutError::validation_with_source("Failed to parse manifest JSON", e))?;

        if !value.is_object() {
            return Err(ScoutError::validation("Manifest body is not a JSON object"));
        }

        let media_type = value
            .get("mediaType")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let is_index = media_type.contains("index")
            || media_type.contains("list")
            || (media_type.is_empty() && value.get("manifests").is_some());

        if is_index {
            let index: ImageIndex = serde_json::from_value(value)
                .map_err(|e| ScoutError::validation_with_source("Failed to parse image index", e))?;
            Ok(Self::Index(index))
        } else {
            let manifest: ImageManifest = serde_json::from_value(value).map_err(|e| {
                ScoutError::validation_with_source("Failed to parse image manifest", e)
            })?;
            Ok(Self::Manifest(manifest))
        }
    }

    /// Size of the tag in bytes.
    ///
    /// For a manifest this is the sum of its layer sizes. An index has no
    /// layers of its own, so the sizes of its child manifests are summed.
    pub fn total_size(&self) -> u64 {
        match self {
            Self::Manifest(m) => m.layers.iter().map(|l| l.size).sum(),
            Self::Index(i) => i.manifests.iter().map(|m| m.size).sum(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}
