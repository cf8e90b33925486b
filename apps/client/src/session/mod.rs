//! Edit session state machine for the CV display surface.
//!
//! `Viewing → Editing → Saving`, with `Saving → Viewing` on success and
//! `Saving → Editing` on failure. Entering an edit session snapshots
//! the current record as an immutable baseline and hands the form a
//! working copy; cancel restores the baseline, save submits the whole
//! working copy and adopts the server's canonical response. The
//! baseline is owned exclusively by the session and never aliased by
//! the visible record while editing.

#![allow(dead_code)]

pub mod diff;
pub mod validate;

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::backend::CvBackend;
use crate::errors::AppError;
use crate::models::cv::CvRecord;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Viewing,
    Editing,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(CvRecord),
    /// A save was already in flight; this request was dropped.
    Ignored,
}

struct SessionInner {
    phase: SessionPhase,
    /// Deep copy of the record at edit-entry time. Immutable for the
    /// session's lifetime; dropped on cancel or successful save.
    baseline: Option<CvRecord>,
    working: Option<CvRecord>,
}

pub struct EditSessionMachine {
    backend: Arc<dyn CvBackend>,
    store: Arc<RecordStore>,
    inner: Mutex<SessionInner>,
}

impl EditSessionMachine {
    pub fn new(backend: Arc<dyn CvBackend>, store: Arc<RecordStore>) -> Self {
        Self {
            backend,
            store,
            inner: Mutex::new(SessionInner {
                phase: SessionPhase::Viewing,
                baseline: None,
                working: None,
            }),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().unwrap().phase
    }

    /// `Viewing → Editing`: snapshot the current record and expose a
    /// working copy. No backend call. Already editing is a no-op.
    pub fn begin(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            SessionPhase::Editing => return Ok(()),
            SessionPhase::Saving => return Err(AppError::SaveInProgress),
            SessionPhase::Viewing => {}
        }
        let record = self.store.current().ok_or(AppError::NoCurrentRecord)?;
        debug!("Edit session opened for record {:?}", record.id);
        inner.baseline = Some(record.clone());
        inner.working = Some(record);
        inner.phase = SessionPhase::Editing;
        Ok(())
    }

    /// Applies a mutation to the working copy. Refused outside
    /// `Editing`.
    pub fn mutate_working(&self, mutate: impl FnOnce(&mut CvRecord)) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != SessionPhase::Editing {
            return Err(AppError::NotEditing);
        }
        match inner.working.as_mut() {
            Some(working) => {
                mutate(working);
                Ok(())
            }
            None => Err(AppError::NotEditing),
        }
    }

    pub fn working(&self) -> Option<CvRecord> {
        self.inner.lock().unwrap().working.clone()
    }

    /// Structural comparison of the working copy against the baseline.
    /// Side-effect free; `false` whenever no edit session is active.
    pub fn has_unsaved_changes(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.phase != SessionPhase::Editing {
            return false;
        }
        match (&inner.working, &inner.baseline) {
            (Some(working), Some(baseline)) => diff::records_differ(working, baseline),
            _ => false,
        }
    }

    /// `Editing → Viewing`: discard the working copy and restore the
    /// baseline as the visible record. No backend call. Canceling a
    /// session with zero mutations is a pure no-op; canceling while a
    /// save is in flight is refused.
    pub fn cancel(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            SessionPhase::Viewing => return Ok(()),
            SessionPhase::Saving => return Err(AppError::SaveInProgress),
            SessionPhase::Editing => {}
        }
        let dirty = match (&inner.working, &inner.baseline) {
            (Some(working), Some(baseline)) => diff::records_differ(working, baseline),
            _ => false,
        };
        if dirty {
            if let Some(baseline) = inner.baseline.clone() {
                info!("Edit canceled, restoring baseline for {:?}", baseline.id);
                self.store.replace(baseline);
            }
        }
        inner.baseline = None;
        inner.working = None;
        inner.phase = SessionPhase::Viewing;
        Ok(())
    }

    /// Toggle entry point for the surface's edit switch. Turning the
    /// mode off runs through [`cancel`](Self::cancel), so a dirty
    /// working copy is restored to the baseline rather than silently
    /// dropped.
    pub fn set_edit_mode(&self, enabled: bool) -> Result<(), AppError> {
        if enabled {
            self.begin()
        } else {
            self.cancel()
        }
    }

    /// `Editing → Saving → {Viewing | Editing}`. Validates first (no
    /// network call on failure), then submits the full working copy.
    /// Success adopts the server's canonical record as both baseline
    /// and visible record; failure keeps the working copy and returns
    /// to `Editing` with the server message surfaced.
    pub async fn save(&self) -> Result<SaveOutcome, AppError> {
        let working = {
            let mut inner = self.inner.lock().unwrap();
            match inner.phase {
                SessionPhase::Saving => return Ok(SaveOutcome::Ignored),
                SessionPhase::Viewing => return Err(AppError::NotEditing),
                SessionPhase::Editing => {}
            }
            let working = inner.working.clone().ok_or(AppError::NotEditing)?;
            let problems = validate::validate(&working);
            if !problems.is_empty() {
                return Err(AppError::Validation(problems.join("; ")));
            }
            inner.phase = SessionPhase::Saving;
            working
        };

        info!("Submitting record {:?}", working.id);
        match self.backend.update_record(&working).await {
            Ok(canonical) => {
                let mut inner = self.inner.lock().unwrap();
                inner.baseline = None;
                inner.working = None;
                inner.phase = SessionPhase::Viewing;
                drop(inner);
                self.store.replace(canonical.clone());
                Ok(SaveOutcome::Saved(canonical))
            }
            Err(e) => {
                warn!("Save failed for {:?}: {e}", working.id);
                let mut inner = self.inner.lock().unwrap();
                inner.phase = SessionPhase::Editing;
                Err(AppError::SaveFailed(e.user_message()))
            }
        }
    }
}
