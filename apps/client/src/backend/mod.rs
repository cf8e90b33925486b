//! Backend client: the single point of entry for all calls to the CV
//! extraction backend.
//!
//! ARCHITECTURAL RULE: no other module may touch the network directly.
//! Components depend on the [`CvBackend`] trait so tests can substitute
//! a scripted implementation.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::export::ExportFormat;
use crate::models::cv::{CvRecord, RecordStatus};
use crate::models::document::{ConversionStatus, DocumentDescriptor};
use crate::upload::SelectedFile;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request reached the backend but the envelope came back with
    /// `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BackendError {
    /// Raw server message when one exists, generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } if !message.is_empty() => message.clone(),
            BackendError::Rejected(message) if !message.is_empty() => message.clone(),
            _ => "The server could not be reached. Please try again.".to_string(),
        }
    }
}

/// Result of an upload attempt. `duplicate` routes the caller into the
/// replace-or-abort decision gate; it is never an error.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub record: Option<CvRecord>,
    pub duplicate: bool,
    pub message: Option<String>,
}

/// Abstract contract over the extraction backend: the document and
/// mutation operations plus the thin list/search/status wrappers the
/// UI surfaces consume.
#[async_trait]
pub trait CvBackend: Send + Sync {
    async fn list_records(&self) -> Result<Vec<CvRecord>, BackendError>;
    async fn get_record(&self, id: &str) -> Result<Option<CvRecord>, BackendError>;
    async fn update_record(&self, record: &CvRecord) -> Result<CvRecord, BackendError>;
    async fn update_fields(&self, id: &str, fields: &Value) -> Result<CvRecord, BackendError>;
    async fn delete_record(&self, id: &str) -> Result<(), BackendError>;
    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, BackendError>;
    async fn replace(&self, id: &str, file: &SelectedFile) -> Result<CvRecord, BackendError>;
    async fn document_info(&self, id: &str) -> Result<DocumentDescriptor, BackendError>;
    async fn document_payload(&self, id: &str) -> Result<Bytes, BackendError>;
    async fn download_original(&self, id: &str) -> Result<Bytes, BackendError>;
    async fn conversion_status(&self) -> Result<ConversionStatus, BackendError>;
    async fn export_as(&self, id: &str, format: ExportFormat) -> Result<Bytes, BackendError>;
    async fn search_by_skills(&self, skills: &[String]) -> Result<Vec<CvRecord>, BackendError>;
    async fn set_status(&self, id: &str, status: RecordStatus) -> Result<(), BackendError>;
}

#[derive(Debug, Deserialize)]
struct CvEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<CvRecord>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    is_duplicate: bool,
}

impl CvEnvelope {
    fn rejection_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unspecified backend rejection".to_string())
    }

    fn into_record(self) -> Result<CvRecord, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.rejection_message()));
        }
        self.data
            .ok_or_else(|| BackendError::Rejected("response carried no record".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CvListEnvelope {
    success: bool,
    #[serde(default)]
    data: Vec<CvRecord>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: String,
}

/// HTTP implementation of [`CvBackend`] against the FastAPI backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.backend_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        api_path(&self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turns a non-success HTTP status into a `BackendError::Api`,
    /// extracting the FastAPI `detail` field when the body carries one.
    async fn status_error(response: Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        warn!("Backend returned {status}: {message}");
        BackendError::Api { status, message }
    }

    async fn fetch_envelope(&self, builder: RequestBuilder) -> Result<CvEnvelope, BackendError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(response.json::<CvEnvelope>().await?)
    }

    async fn fetch_bytes(&self, path: &str) -> Result<Bytes, BackendError> {
        let response = self.authed(self.client.get(self.url(path))).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let payload = response.bytes().await?;
        debug!("Fetched {} bytes from {path}", payload.len());
        Ok(payload)
    }

    fn multipart_form(file: &SelectedFile) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone());
        reqwest::multipart::Form::new().part("file", part)
    }
}

#[async_trait]
impl CvBackend for HttpBackend {
    async fn list_records(&self) -> Result<Vec<CvRecord>, BackendError> {
        let response = self.authed(self.client.get(self.url("/"))).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let envelope = response.json::<CvListEnvelope>().await?;
        if !envelope.success {
            return Err(BackendError::Rejected(
                envelope.message.unwrap_or_else(|| "listing failed".to_string()),
            ));
        }
        Ok(envelope.data)
    }

    async fn get_record(&self, id: &str) -> Result<Option<CvRecord>, BackendError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/{id}"))))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let envelope = response.json::<CvEnvelope>().await?;
        envelope.into_record().map(Some)
    }

    async fn update_record(&self, record: &CvRecord) -> Result<CvRecord, BackendError> {
        let id = record
            .id
            .as_deref()
            .ok_or_else(|| BackendError::Rejected("record has no id".to_string()))?;
        debug!("PUT record {id}");
        let envelope = self
            .fetch_envelope(
                self.authed(self.client.put(self.url(&format!("/{id}"))))
                    .json(record),
            )
            .await?;
        envelope.into_record()
    }

    async fn update_fields(&self, id: &str, fields: &Value) -> Result<CvRecord, BackendError> {
        debug!("PATCH record {id}: {fields}");
        let envelope = self
            .fetch_envelope(
                self.authed(self.client.patch(self.url(&format!("/{id}"))))
                    .json(fields),
            )
            .await?;
        envelope.into_record()
    }

    async fn delete_record(&self, id: &str) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/{id}"))))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, BackendError> {
        debug!("Uploading {} ({} bytes)", file.name, file.bytes.len());
        let envelope = self
            .fetch_envelope(
                self.authed(self.client.post(self.url("/upload")))
                    .multipart(Self::multipart_form(file)),
            )
            .await?;
        // A duplicate comes back with success=false and the existing
        // record in `data`; it is a branch, not a failure.
        if envelope.is_duplicate {
            return Ok(UploadReceipt {
                message: envelope.message.clone(),
                record: envelope.data,
                duplicate: true,
            });
        }
        if !envelope.success {
            return Err(BackendError::Rejected(envelope.rejection_message()));
        }
        Ok(UploadReceipt {
            message: envelope.message.clone(),
            record: envelope.data,
            duplicate: false,
        })
    }

    async fn replace(&self, id: &str, file: &SelectedFile) -> Result<CvRecord, BackendError> {
        debug!("Replacing record {id} with {}", file.name);
        let envelope = self
            .fetch_envelope(
                self.authed(self.client.post(self.url(&format!("/{id}/replace"))))
                    .multipart(Self::multipart_form(file)),
            )
            .await?;
        envelope.into_record()
    }

    async fn document_info(&self, id: &str) -> Result<DocumentDescriptor, BackendError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/{id}/document/info"))))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(response.json::<DocumentDescriptor>().await?)
    }

    async fn document_payload(&self, id: &str) -> Result<Bytes, BackendError> {
        self.fetch_bytes(&format!("/{id}/document")).await
    }

    async fn download_original(&self, id: &str) -> Result<Bytes, BackendError> {
        self.fetch_bytes(&format!("/{id}/document/download")).await
    }

    async fn conversion_status(&self) -> Result<ConversionStatus, BackendError> {
        let response = self
            .authed(self.client.get(self.url("/conversion/status")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(response.json::<ConversionStatus>().await?)
    }

    async fn export_as(&self, id: &str, format: ExportFormat) -> Result<Bytes, BackendError> {
        self.fetch_bytes(&format!("/{id}/export/{}", format.endpoint()))
            .await
    }

    async fn search_by_skills(&self, skills: &[String]) -> Result<Vec<CvRecord>, BackendError> {
        let response = self
            .authed(self.client.get(self.url("/search/skills")))
            .query(&[("skills", skills.join(","))])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let envelope = response.json::<CvListEnvelope>().await?;
        Ok(envelope.data)
    }

    async fn set_status(&self, id: &str, status: RecordStatus) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.put(self.url(&format!("/{id}/status"))))
            .query(&[("status", status.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }
}

fn api_path(base: &str, path: &str) -> String {
    format!("{}/api/cv{}", base.trim_end_matches('/'), path)
}
