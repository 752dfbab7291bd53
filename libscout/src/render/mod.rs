//! Rendering of search results as text, JSON or YAML.

use crate::error::{Result, ScoutError};
use crate::image::ImageRecord;
use humansize::{DECIMAL, FormatSizeOptions, format_size as format_size_human};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::{Padding, Style};


const IMAGE_WIDTH: usize = 32;
const TAG_WIDTH: usize = 24;
const DIGEST_WIDTH: usize = 8;
const SIZE_WIDTH: usize = 8;

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned table
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = ScoutError;

    /// Parses a format name case-insensitively. The empty string means text.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::render::OutputFormat;
    ///
    /// assert_eq!("".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    /// assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    /// assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    /// assert!("xml".parse::<OutputFormat>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ScoutError::invalid_output_format(s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

/// Formats a byte count with decimal units and no space: `100B`, `5.0MB`.
///
/// Values are rounded to a tenth of their unit first, so a count just below a
/// unit boundary rolls over (`999_999` is `1.0MB`). One decimal is kept below
/// 10 units, none above.
///
/// # Examples
///
/// ```
/// use libscout::render::format_size;
///
/// assert_eq!(format_size(100), "100B");
/// assert_eq!(format_size(5_000_000), "5.0MB");
/// assert_eq!(format_size(12_345_678), "12MB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    let rounded = round_for_display(size_bytes);
    let scale = unit_scale(rounded);
    let places = if scale > 1 && rounded / scale < 10 { 1 } else { 0 };

    let options = FormatSizeOptions::from(DECIMAL)
        .decimal_places(places)
        .decimal_zeroes(places)
        .space_after_value(false);
    format_size_human(rounded, options)
}

/// Largest power of 1000 not above `n` (1 for `n < 1000`).
fn unit_scale(n: u64) -> u64 {
    let mut scale = 1u64;
    while let Some(next) = scale.checked_mul(1000) {
        if next > n {
            break;
        }
        scale = next;
    }
    scale
}

/// Rounds `n` to the precision it is displayed with: tenths of a unit below
/// 10 units, whole units above.
fn round_for_display(n: u64) -> u64 {
    let scale = u128::from(unit_scale(n));
    if scale == 1 {
        return n;
    }
    let n = u128::from(n);
    let tenths = (n * 10 + scale / 2) / scale;
    let rounded = if tenths < 100 {
        tenths * scale / 10
    } else {
        (n + scale / 2) / scale * scale
    };
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "IMAGE NAME")]
    image: String,
    #[tabled(rename = "TAG")]
    tag: String,
    #[tabled(rename = "DIGEST")]
    digest: String,
    #[tabled(rename = "SIZE")]
    size: String,
}

/// Renders images in the requested format.
///
/// Text output is one table row per tag; an empty slice renders as an
/// empty string. Structured formats serialize the slice as a list.
pub fn render(records: &[ImageRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(records)),
        OutputFormat::Json => serde_json::to_string_pretty(records)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ScoutError::validation_with_source("Failed to serialize to JSON", e)),
        OutputFormat::Yaml => serde_yaml::to_string(records)
            .map_err(|e| ScoutError::validation_with_source("Failed to serialize to YAML", e)),
    }
}

/// Renders one image on its own.
///
/// Used when results are printed as they arrive: text yields rows without a
/// header, structured formats yield a single object.
pub fn render_image(record: &ImageRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_rows(std::slice::from_ref(record), false)),
        OutputFormat::Json => serde_json::to_string_pretty(record)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ScoutError::validation_with_source("Failed to serialize to JSON", e)),
        OutputFormat::Yaml => serde_yaml::to_string(record)
            .map_err(|e| ScoutError::validation_with_source("Failed to serialize to YAML", e)),
    }
}

/// Renders the text table, header included.
pub fn render_text(records: &[ImageRecord]) -> String {
    render_rows(records, true)
}

fn render_rows(records: &[ImageRecord], header: bool) -> String {
    let rows: Vec<TagRow> = records
        .iter()
        .flat_map(|image| {
            image.tags.iter().map(move |tag| TagRow {
                image: ellipsize(&image.name, IMAGE_WIDTH, "..."),
                tag: ellipsize(&tag.name, TAG_WIDTH, "..."),
                digest: ellipsize(&tag.digest, DIGEST_WIDTH, ""),
                size: ellipsize(&format_size(tag.size), SIZE_WIDTH, "..."),
            })
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    if header {
        builder.push_record(TagRow::headers());
    }
    for row in &rows {
        builder.push_record(row.fields());
    }
    let table = builder
        .build()
        .with(Style::empty())
        .with(Padding::new(0, 2, 0, 0))
        .to_string();

    let mut out = String::with_capacity(table.len() + 1);
    for line in table.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Truncates `text` to at most `max` characters, ending in `tail` when cut.
fn ellipsize(text: &str, max: usize, tail: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(tail.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(tail);
    out
}
