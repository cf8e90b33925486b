//! Export of a record to a downloadable file.
//!
//! Maps the requested format to a backend endpoint, a MIME type and a
//! generated filename, fetches the payload as opaque bytes and hands it
//! to a [`FileSaver`]. The disk implementation writes through a named
//! temp file and persists it atomically, so a failed export never
//! leaves a partial file behind.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::backend::CvBackend;
use crate::errors::AppError;
use crate::models::cv::CvRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
    /// The in-house Word rendition produced by the backend.
    Docx,
}

impl ExportFormat {
    /// Path segment under `/export/` on the backend.
    pub fn endpoint(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "text",
            ExportFormat::Docx => "onetech",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ExportFormat::Json => ".json",
            ExportFormat::Text => ".txt",
            ExportFormat::Docx => "_OneTech.docx",
        }
    }
}

/// Save-to-disk side effect, abstracted so the dispatcher can be tested
/// without touching the filesystem.
pub trait FileSaver: Send + Sync {
    fn save(&self, payload: &[u8], filename: &str, mime: &str) -> Result<PathBuf>;
}

/// Writes exports into a target directory, atomically.
pub struct DiskSaver {
    dir: PathBuf,
}

impl DiskSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSaver for DiskSaver {
    fn save(&self, payload: &[u8], filename: &str, _mime: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating export directory {}", self.dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload)?;
        let path = self.dir.join(filename);
        tmp.persist(&path)
            .with_context(|| format!("writing export file {}", path.display()))?;
        Ok(path)
    }
}

pub struct ExportDispatcher {
    backend: Arc<dyn CvBackend>,
    saver: Arc<dyn FileSaver>,
}

impl ExportDispatcher {
    pub fn new(backend: Arc<dyn CvBackend>, saver: Arc<dyn FileSaver>) -> Self {
        Self { backend, saver }
    }

    /// Exports `record` in the requested format and saves it. The
    /// filename stamp is regenerated on every attempt.
    pub async fn export(
        &self,
        record: &CvRecord,
        format: ExportFormat,
    ) -> Result<PathBuf, AppError> {
        let id = record.id.as_deref().ok_or(AppError::MissingIdentity)?;
        let payload = self.backend.export_as(id, format).await?;
        let filename = export_filename(record, format, Utc::now().date_naive());
        let path = self.saver.save(&payload, &filename, format.mime())?;
        info!("Exported record {id} as {} ({} bytes)", filename, payload.len());
        Ok(path)
    }

    /// Saves the untouched originally uploaded file under its original
    /// name.
    pub async fn download_original(&self, record: &CvRecord) -> Result<PathBuf, AppError> {
        let id = record.id.as_deref().ok_or(AppError::MissingIdentity)?;
        let payload = self.backend.download_original(id).await?;
        let filename = record
            .original_filename
            .clone()
            .unwrap_or_else(|| format!("CV_{id}.bin"));
        let mime = mime_for_filename(&filename);
        let path = self.saver.save(&payload, &filename, mime)?;
        info!("Downloaded original of record {id} to {}", path.display());
        Ok(path)
    }
}

/// `CV_<name>_<YYYYMMDD><suffix>`, where `<name>` is the sanitized
/// person name or `cv` when extraction found none.
fn export_filename(record: &CvRecord, format: ExportFormat, date: NaiveDate) -> String {
    let name = record
        .person_name()
        .map(sanitize_fragment)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "cv".to_string());
    format!("CV_{name}_{}{}", date.format("%Y%m%d"), format.suffix())
}

/// Keeps ASCII alphanumerics, folds everything else into single
/// underscores.
fn sanitize_fragment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Content type by extension, mirroring what the backend serves.
fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
