//! Quick single-field saves outside of an edit session.
//!
//! Adds or removes one entry of a flat collection (technical skills,
//! certifications) and PATCHes just that collection. Mutually exclusive
//! with the edit session: while a session is active the channel refuses
//! to run, so the two mutation paths can never race on one record.
//!
//! The local mutation is optimistic. On a failed PATCH it is left in
//! place and the error is reported; the next full record load
//! reconciles the store with the server.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::backend::CvBackend;
use crate::errors::AppError;
use crate::models::cv::CvRecord;
use crate::session::{EditSessionMachine, SessionPhase};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickField {
    Skills,
    Certifications,
}

impl QuickField {
    fn wire_name(self) -> &'static str {
        match self {
            QuickField::Skills => "competences_techniques",
            QuickField::Certifications => "certifications",
        }
    }

    fn values(self, record: &CvRecord) -> &Vec<String> {
        match self {
            QuickField::Skills => &record.skills,
            QuickField::Certifications => &record.certifications,
        }
    }

    fn values_mut(self, record: &mut CvRecord) -> &mut Vec<String> {
        match self {
            QuickField::Skills => &mut record.skills,
            QuickField::Certifications => &mut record.certifications,
        }
    }
}

pub struct AutoSaveChannel {
    backend: Arc<dyn CvBackend>,
    store: Arc<RecordStore>,
}

impl AutoSaveChannel {
    pub fn new(backend: Arc<dyn CvBackend>, store: Arc<RecordStore>) -> Self {
        Self { backend, store }
    }

    /// Appends `value` to the collection. Rejected without a network
    /// call when the trimmed value is empty or already present
    /// (case-insensitive).
    pub async fn add(
        &self,
        session: &EditSessionMachine,
        field: QuickField,
        value: &str,
    ) -> Result<CvRecord, AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::Validation("The value cannot be empty".to_string()));
        }
        let (id, mut record) = self.writable_record(session)?;
        if field
            .values(&record)
            .iter()
            .any(|existing| existing.trim().eq_ignore_ascii_case(value))
        {
            return Err(AppError::DuplicateEntry(value.to_string()));
        }
        field.values_mut(&mut record).push(value.to_string());
        self.push_collection(&id, field, record).await
    }

    /// Removes `value` from the collection (case-insensitive). Removing
    /// a value that is not present is a no-op without a network call.
    pub async fn remove(
        &self,
        session: &EditSessionMachine,
        field: QuickField,
        value: &str,
    ) -> Result<CvRecord, AppError> {
        let value = value.trim();
        let (id, mut record) = self.writable_record(session)?;
        let values = field.values_mut(&mut record);
        let before = values.len();
        values.retain(|existing| !existing.trim().eq_ignore_ascii_case(value));
        if values.len() == before {
            return Ok(record);
        }
        self.push_collection(&id, field, record).await
    }

    fn writable_record(
        &self,
        session: &EditSessionMachine,
    ) -> Result<(String, CvRecord), AppError> {
        let record = self.store.current().ok_or(AppError::NoCurrentRecord)?;
        let id = record.id.clone().ok_or(AppError::MissingIdentity)?;
        if session.phase() != SessionPhase::Viewing {
            return Err(AppError::EditSessionActive);
        }
        Ok((id, record))
    }

    async fn push_collection(
        &self,
        id: &str,
        field: QuickField,
        record: CvRecord,
    ) -> Result<CvRecord, AppError> {
        let values = field.values(&record).clone();
        // Optimistic: the surface shows the new value while the PATCH
        // is in flight.
        self.store.replace(record);

        let body = json!({ (field.wire_name()): values });
        match self.backend.update_fields(id, &body).await {
            Ok(canonical) => {
                info!("Quick save of {} applied to {id}", field.wire_name());
                self.store.replace(canonical.clone());
                Ok(canonical)
            }
            Err(e) => {
                warn!(
                    "Quick save of {} failed for {id}: {e}; local value kept",
                    field.wire_name()
                );
                Err(AppError::Backend(e))
            }
        }
    }
}
