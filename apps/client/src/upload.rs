//! Upload flow and duplicate resolution.
//!
//! Sits upstream of the record store: an upload either lands as a new
//! current record, or, when the backend recognizes the file as an
//! already-persisted CV, opens a decision gate holding the existing
//! record's id and the selected file. Nothing is mutated until the gate
//! takes one of its two exits: replace re-submits the file against the
//! existing record, abort discards the selection.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::{info, warn};

use crate::backend::{BackendError, CvBackend};
use crate::errors::AppError;
use crate::models::cv::CvRecord;
use crate::store::RecordStore;

/// A file picked by the user, held in memory until the upload (or
/// replace) settles.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Bytes,
}

/// A pending replace-or-abort decision for a duplicate upload.
#[derive(Debug, Clone)]
pub struct DuplicateCandidate {
    pub existing_id: String,
    pub file: SelectedFile,
}

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// The record was accepted and is now the current record.
    Completed(CvRecord),
    /// The backend matched an existing record; the decision gate is
    /// open. Not an error.
    DuplicateDetected { existing_id: String },
}

pub struct UploadCoordinator {
    backend: Arc<dyn CvBackend>,
    store: Arc<RecordStore>,
    pending: Mutex<Option<DuplicateCandidate>>,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn CvBackend>, store: Arc<RecordStore>) -> Self {
        Self { backend, store, pending: Mutex::new(None) }
    }

    pub async fn upload(&self, file: SelectedFile) -> Result<UploadOutcome, AppError> {
        info!("Uploading {} ({} bytes)", file.name, file.bytes.len());
        let receipt = self.backend.upload(&file).await?;

        if receipt.duplicate {
            let existing_id = receipt
                .record
                .and_then(|record| record.id)
                .ok_or_else(|| {
                    BackendError::Rejected("duplicate response carried no record".to_string())
                })?;
            info!("Duplicate of record {existing_id}; awaiting decision");
            *self.pending.lock().unwrap() =
                Some(DuplicateCandidate { existing_id: existing_id.clone(), file });
            return Ok(UploadOutcome::DuplicateDetected { existing_id });
        }

        let record = receipt.record.ok_or_else(|| {
            BackendError::Rejected("upload response carried no record".to_string())
        })?;
        self.store.replace(record.clone());
        Ok(UploadOutcome::Completed(record))
    }

    pub fn pending(&self) -> Option<DuplicateCandidate> {
        self.pending.lock().unwrap().clone()
    }

    /// Replace exit: re-submits the held file against the existing
    /// record. On success the result is treated like a fresh upload and
    /// the gate closes; on failure the gate stays open so the user can
    /// retry or abort.
    pub async fn resolve_replace(&self) -> Result<CvRecord, AppError> {
        let candidate = self
            .pending
            .lock()
            .unwrap()
            .clone()
            .ok_or(AppError::NoPendingDuplicate)?;

        match self.backend.replace(&candidate.existing_id, &candidate.file).await {
            Ok(record) => {
                info!("Record {} replaced with {}", candidate.existing_id, candidate.file.name);
                *self.pending.lock().unwrap() = None;
                self.store.replace(record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!("Replace of {} failed: {e}", candidate.existing_id);
                Err(AppError::Backend(e))
            }
        }
    }

    /// Abort exit: closes the gate and drops the selected file. The
    /// store is left exactly as it was before the upload attempt.
    pub fn resolve_abort(&self) {
        if self.pending.lock().unwrap().take().is_some() {
            info!("Duplicate upload aborted");
        }
    }
}
