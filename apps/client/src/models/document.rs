#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Metadata about the original uploaded file backing a record, as
/// returned by `GET /api/cv/{id}/document/info`.
///
/// A descriptor is immutable for one preview load cycle; the next load
/// fetches a fresh one and supersedes it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub filename: Option<String>,
    /// File size in kilobytes.
    #[serde(default)]
    pub size: f64,
    /// Lowercased extension including the dot, e.g. `".pdf"`.
    #[serde(rename = "type", default)]
    pub extension: String,
    #[serde(default)]
    pub can_preview: bool,
    #[serde(default)]
    pub needs_conversion: bool,
    #[serde(default)]
    pub conversion_available: bool,
    #[serde(rename = "lastModified", default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Process-wide conversion capability, probed once from
/// `GET /api/cv/conversion/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStatus {
    #[serde(rename = "conversion_available", default)]
    pub available: bool,
    #[serde(rename = "supported_formats", default)]
    pub formats: Vec<String>,
}
