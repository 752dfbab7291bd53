//! Image and tag records produced by a search.

use crate::aggregate::JobResult;
use crate::error::ScoutError;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// One tag of an image, sized from its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag name
    pub name: String,
    /// Manifest digest with any `sha256:` prefix removed
    pub digest: String,
    /// Sum of the layer sizes in bytes
    pub size: u64,
}

impl TagRecord {
    /// Builds a tag record, stripping the `sha256:` prefix from `digest`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::image::TagRecord;
    ///
    /// let tag = TagRecord::new("latest", "sha256:abc123", 100);
    /// assert_eq!(tag.digest, "abc123");
    /// ```
    pub fn new(name: impl Into<String>, digest: &str, size: u64) -> Self {
        Self {
            name: name.into(),
            digest: digest.strip_prefix("sha256:").unwrap_or(digest).to_string(),
            size,
        }
    }
}

/// An image and the tags found for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub name: String,
    pub tags: Vec<TagRecord>,
}

impl ImageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }
}

/// A branch of the search that failed, with whatever attribution is known.
#[derive(Debug)]
pub struct SearchFailure {
    pub image: Option<String>,
    pub tag: Option<String>,
    pub error: ScoutError,
}

/// Everything a finished search produced, grouped by image.
#[derive(Debug, Default)]
pub struct SearchReport {
    /// Images in order of first appearance
    pub images: Vec<ImageRecord>,
    pub failures: Vec<SearchFailure>,
    /// Number of units of work abandoned because the search was cancelled
    pub cancelled: usize,
}

impl SearchReport {
    /// Total number of tag records across all images.
    pub fn tag_count(&self) -> usize {
        self.images.iter().map(|i| i.tags.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.failures.is_empty()
    }
}

/// Groups a stream of results into per-image records.
///
/// Images and tags keep their arrival order; call [`sort_records`] for a
/// deterministic listing.
pub fn collect_records<I>(results: I) -> SearchReport
where
    I: IntoIterator<Item = JobResult>,
{
    let mut report = SearchReport::default();

    for result in results {
        match result {
            JobResult::Tag { image, tag } => {
                match report.images.iter_mut().find(|r| r.name == image) {
                    Some(record) => record.tags.push(tag),
                    None => report.images.push(ImageRecord {
                        name: image,
                        tags: vec![tag],
                    }),
                }
            }
            JobResult::Failed { image, tag, error } => {
                report.failures.push(SearchFailure { image, tag, error });
            }
            JobResult::Cancelled { .. } => report.cancelled += 1,
        }
    }

    report
}

/// Sorts images by name and each image's tags by name.
pub fn sort_records(records: &mut [ImageRecord]) {
    records.sort_by(|a, b| a.name.cmp(&b.name));
    for record in records.iter_mut() {
        record.tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
}
