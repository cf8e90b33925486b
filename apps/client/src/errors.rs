#![allow(dead_code)]

use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type returned by the mutation paths
/// (edit session, quick saves, upload, export).
///
/// Preview failures never surface here: the preview controller keeps
/// its own terminal error state (`preview::PreviewError`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Record has not been saved yet")]
    MissingIdentity,

    #[error("No record is currently selected")]
    NoCurrentRecord,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("'{0}' is already in the list")]
    DuplicateEntry(String),

    #[error("Finish or cancel the current edit before quick-saving")]
    EditSessionActive,

    #[error("No edit session is active")]
    NotEditing,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("No duplicate decision is pending")]
    NoPendingDuplicate,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message suitable for direct display to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
