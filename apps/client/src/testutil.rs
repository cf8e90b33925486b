//! Shared test fixtures: a scriptable in-memory backend and record
//! builders. Compiled only for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::backend::{BackendError, CvBackend, UploadReceipt};
use crate::export::ExportFormat;
use crate::models::cv::{
    CvMetadata, CvRecord, Experience, Formation, LanguageSkill, PersonalInfo, RecordStatus,
};
use crate::models::document::{ConversionStatus, DocumentDescriptor};
use crate::upload::SelectedFile;

pub fn sample_record(id: &str) -> CvRecord {
    let stamp =
        NaiveDateTime::parse_from_str("2024-05-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    CvRecord {
        id: Some(id.to_string()),
        personal: PersonalInfo {
            name: Some("Jean Dupont".to_string()),
            email: Some("jean@example.com".to_string()),
            phone: Some("+33 6 00 00 00 00".to_string()),
            address: Some("Tunis".to_string()),
        },
        skills: vec!["Rust".to_string(), "Python".to_string()],
        experiences: vec![
            Experience {
                period: "2020-2023".to_string(),
                role: "Backend developer".to_string(),
                company: "Acme".to_string(),
                description: "Built services".to_string(),
            },
            Experience {
                period: "2018-2020".to_string(),
                role: "Intern".to_string(),
                company: "Globex".to_string(),
                description: "Tooling".to_string(),
            },
        ],
        formations: vec![Formation {
            year: "2018".to_string(),
            degree: "Master".to_string(),
            institution: "ENIT".to_string(),
            honors: "Bien".to_string(),
        }],
        certifications: vec!["AWS".to_string()],
        languages: vec![LanguageSkill {
            language: "Anglais".to_string(),
            level: Some("C1".to_string()),
        }],
        document_type: "CV".to_string(),
        metadata: CvMetadata {
            word_count: 350,
            extracted_at: "2024-05-01 10:00:00".to_string(),
            text_preview: Some("Jean Dupont".to_string()),
            file_size_kb: 84.2,
        },
        nlp_enrichment: None,
        original_filename: None,
        file_hash: Some("d41d8cd98f00b204e9800998ecf8427e".to_string()),
        status: RecordStatus::Completed,
        created_at: Some(stamp),
        updated_at: Some(stamp),
    }
}

pub fn descriptor(
    extension: &str,
    can_preview: bool,
    needs_conversion: bool,
    conversion_available: bool,
) -> DocumentDescriptor {
    DocumentDescriptor {
        available: true,
        filename: Some(format!("resume{extension}")),
        size: 84.2,
        extension: extension.to_string(),
        can_preview,
        needs_conversion,
        conversion_available,
        last_modified: None,
        url: None,
    }
}

fn not_found() -> BackendError {
    BackendError::Api { status: 404, message: "CV non trouvé".to_string() }
}

fn scripted_failure(message: &str) -> BackendError {
    BackendError::Api { status: 500, message: message.to_string() }
}

/// Scriptable [`CvBackend`] with a call log, so tests can assert both
/// outcomes and the exact set of network calls issued.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<String>>,
    records: Mutex<HashMap<String, CvRecord>>,
    descriptors: Mutex<HashMap<String, DocumentDescriptor>>,
    payloads: Mutex<HashMap<String, Bytes>>,
    payload_delays: Mutex<HashMap<String, Duration>>,
    exports: Mutex<HashMap<String, Bytes>>,
    downloads: Mutex<HashMap<String, Bytes>>,
    last_update: Mutex<Option<CvRecord>>,
    last_patch: Mutex<Option<Value>>,
    update_delay: Mutex<Option<Duration>>,
    update_failure: Mutex<Option<String>>,
    patch_failure: Mutex<Option<String>>,
    export_failure: Mutex<Option<String>>,
    replace_failure: Mutex<Option<String>>,
    upload_reply: Mutex<Option<(CvRecord, bool)>>,
    replace_reply: Mutex<Option<CvRecord>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn log(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn seed_record(&self, record: CvRecord) {
        if let Some(id) = record.id.clone() {
            self.records.lock().unwrap().insert(id, record);
        }
    }

    pub fn script_descriptor(&self, id: &str, descriptor: DocumentDescriptor) {
        self.descriptors.lock().unwrap().insert(id.to_string(), descriptor);
    }

    pub fn script_payload(&self, id: &str, payload: &[u8]) {
        self.payloads.lock().unwrap().insert(id.to_string(), Bytes::copy_from_slice(payload));
    }

    pub fn script_payload_delay(&self, id: &str, delay: Duration) {
        self.payload_delays.lock().unwrap().insert(id.to_string(), delay);
    }

    pub fn script_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_update(&self, message: &str) {
        *self.update_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_patch(&self, message: &str) {
        *self.patch_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_export(&self, message: &str) {
        *self.export_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_replace(&self, message: &str) {
        *self.replace_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn script_upload_success(&self, record: CvRecord) {
        *self.upload_reply.lock().unwrap() = Some((record, false));
    }

    pub fn script_upload_duplicate(&self, existing: CvRecord) {
        *self.upload_reply.lock().unwrap() = Some((existing, true));
    }

    pub fn script_replace_success(&self, record: CvRecord) {
        *self.replace_reply.lock().unwrap() = Some(record);
    }

    pub fn script_export(&self, id: &str, payload: &[u8]) {
        self.exports.lock().unwrap().insert(id.to_string(), Bytes::copy_from_slice(payload));
    }

    pub fn script_download(&self, id: &str, payload: &[u8]) {
        self.downloads.lock().unwrap().insert(id.to_string(), Bytes::copy_from_slice(payload));
    }

    pub fn last_update(&self) -> Option<CvRecord> {
        self.last_update.lock().unwrap().clone()
    }

    pub fn last_patch(&self) -> Option<Value> {
        self.last_patch.lock().unwrap().clone()
    }
}

#[async_trait]
impl CvBackend for MockBackend {
    async fn list_records(&self) -> Result<Vec<CvRecord>, BackendError> {
        self.log("list");
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn get_record(&self, id: &str) -> Result<Option<CvRecord>, BackendError> {
        self.log(format!("get:{id}"));
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn update_record(&self, record: &CvRecord) -> Result<CvRecord, BackendError> {
        let id = record.id.clone().unwrap_or_default();
        self.log(format!("update:{id}"));
        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.last_update.lock().unwrap() = Some(record.clone());
        if let Some(message) = self.update_failure.lock().unwrap().clone() {
            return Err(scripted_failure(&message));
        }
        // Echo the submitted record the way the backend does, with the
        // status normalized.
        let mut canonical = record.clone();
        canonical.status = RecordStatus::Completed;
        self.records.lock().unwrap().insert(id, canonical.clone());
        Ok(canonical)
    }

    async fn update_fields(&self, id: &str, fields: &Value) -> Result<CvRecord, BackendError> {
        self.log(format!("patch:{id}"));
        *self.last_patch.lock().unwrap() = Some(fields.clone());
        if let Some(message) = self.patch_failure.lock().unwrap().clone() {
            return Err(scripted_failure(&message));
        }
        let mut records = self.records.lock().unwrap();
        let existing = records.get(id).cloned().ok_or_else(not_found)?;
        let mut merged = serde_json::to_value(&existing)?;
        if let (Some(target), Some(updates)) = (merged.as_object_mut(), fields.as_object()) {
            for (key, value) in updates {
                target.insert(key.clone(), value.clone());
            }
        }
        let canonical: CvRecord = serde_json::from_value(merged)?;
        records.insert(id.to_string(), canonical.clone());
        Ok(canonical)
    }

    async fn delete_record(&self, id: &str) -> Result<(), BackendError> {
        self.log(format!("delete:{id}"));
        self.records.lock().unwrap().remove(id).map(|_| ()).ok_or_else(not_found)
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, BackendError> {
        self.log(format!("upload:{}", file.name));
        match self.upload_reply.lock().unwrap().clone() {
            Some((record, duplicate)) => Ok(UploadReceipt {
                record: Some(record),
                duplicate,
                message: None,
            }),
            None => Err(scripted_failure("upload not scripted")),
        }
    }

    async fn replace(&self, id: &str, file: &SelectedFile) -> Result<CvRecord, BackendError> {
        self.log(format!("replace:{id}:{}", file.name));
        if let Some(message) = self.replace_failure.lock().unwrap().clone() {
            return Err(scripted_failure(&message));
        }
        self.replace_reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| scripted_failure("replace not scripted"))
    }

    async fn document_info(&self, id: &str) -> Result<DocumentDescriptor, BackendError> {
        self.log(format!("info:{id}"));
        self.descriptors.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn document_payload(&self, id: &str) -> Result<Bytes, BackendError> {
        self.log(format!("payload:{id}"));
        let delay = self.payload_delays.lock().unwrap().get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.payloads.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn download_original(&self, id: &str) -> Result<Bytes, BackendError> {
        self.log(format!("download:{id}"));
        self.downloads.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn conversion_status(&self) -> Result<ConversionStatus, BackendError> {
        self.log("conversion_status");
        Ok(ConversionStatus { available: true, formats: vec![".docx".into(), ".doc".into()] })
    }

    async fn export_as(&self, id: &str, format: ExportFormat) -> Result<Bytes, BackendError> {
        self.log(format!("export:{id}:{}", format.endpoint()));
        if let Some(message) = self.export_failure.lock().unwrap().clone() {
            return Err(scripted_failure(&message));
        }
        self.exports.lock().unwrap().get(id).cloned().ok_or_else(not_found)
    }

    async fn search_by_skills(&self, skills: &[String]) -> Result<Vec<CvRecord>, BackendError> {
        self.log(format!("search:{}", skills.join(",")));
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| {
                skills.iter().all(|wanted| {
                    r.skills.iter().any(|s| s.eq_ignore_ascii_case(wanted))
                })
            })
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: &str, status: RecordStatus) -> Result<(), BackendError> {
        self.log(format!("status:{id}:{}", status.as_str()));
        let mut records = self.records.lock().unwrap();
        match records.get_mut(id) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(not_found()),
        }
    }
}
