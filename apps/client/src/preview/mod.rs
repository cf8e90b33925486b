//! Document preview coordinator.
//!
//! Given the current record, fetches the document descriptor, classifies
//! the original file, decides whether a previewable payload can be
//! fetched (PDF directly, Word only through server-side conversion) and
//! manages the single live display resource. Responses from superseded
//! loads are discarded by a generation counter, so rapid record
//! switching never flashes a stale document.
//!
//! Preview failures are fully local: they become a terminal error state
//! on the controller and are never propagated to callers.

#![allow(dead_code)]

pub mod resource;

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::CvBackend;
use crate::models::cv::CvRecord;
use crate::models::document::DocumentDescriptor;
use crate::store::RecordStore;

use self::resource::{ResourceHandle, ResourceId, ResourcePool};

/// Format classification of the original file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Other,
}

impl DocumentKind {
    pub fn from_filename(filename: Option<&str>) -> Self {
        let ext = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("doc") | Some("docx") => DocumentKind::Word,
            _ => DocumentKind::Other,
        }
    }
}

/// Terminal preview failures. Each maps to one fixed user-facing
/// message; only unclassified network failures fall through to a
/// generic one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("document metadata lookup failed")]
    MetadataUnavailable,

    #[error("format not previewable")]
    UnsupportedFormat,

    #[error("server has no conversion capability")]
    ConversionUnavailable,

    #[error("server conversion did not produce a preview")]
    ConversionFailed,

    #[error("document payload was empty")]
    EmptyPayload,

    #[error("network failure: {0}")]
    Network(String),
}

impl PreviewError {
    pub fn user_message(&self) -> String {
        match self {
            PreviewError::MetadataUnavailable => {
                "The document details could not be loaded.".to_string()
            }
            PreviewError::UnsupportedFormat => {
                "Preview is not available for this file type.".to_string()
            }
            PreviewError::ConversionUnavailable => {
                "The server cannot convert Word documents for preview.".to_string()
            }
            PreviewError::ConversionFailed => {
                "The Word document could not be converted for preview.".to_string()
            }
            PreviewError::EmptyPayload => "The document appears to be empty.".to_string(),
            PreviewError::Network(message) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Point-in-time view of the controller for rendering.
#[derive(Debug, Clone)]
pub struct PreviewSnapshot {
    pub phase: PreviewPhase,
    pub kind: Option<DocumentKind>,
    /// The displayed content is a server-converted representation of
    /// the original (informational, not an error).
    pub converted: bool,
    pub error: Option<PreviewError>,
    pub resource: Option<ResourceId>,
}

enum State {
    Idle,
    Loading,
    Ready { handle: ResourceHandle, converted: bool },
    Failed(PreviewError),
}

struct Inner {
    generation: u64,
    state: State,
    kind: Option<DocumentKind>,
    descriptor: Option<DocumentDescriptor>,
    pool: ResourcePool,
}

pub struct DocumentPreviewController {
    backend: Arc<dyn CvBackend>,
    /// Process-wide capability flag from the conversion-status probe,
    /// obtained once at startup.
    conversion_supported: bool,
    inner: Mutex<Inner>,
}

impl DocumentPreviewController {
    pub fn new(backend: Arc<dyn CvBackend>, conversion_supported: bool) -> Self {
        Self {
            backend,
            conversion_supported,
            inner: Mutex::new(Inner {
                generation: 0,
                state: State::Idle,
                kind: None,
                descriptor: None,
                pool: ResourcePool::new(),
            }),
        }
    }

    /// Loads (or reloads) the preview for `record`. Always safe to call
    /// again while a previous load is in flight: the newest call wins
    /// and stale responses are dropped on arrival.
    pub async fn load_preview(&self, record: &CvRecord) {
        let kind = DocumentKind::from_filename(record.original_filename.as_deref());
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            inner.generation += 1;
            inner.kind = Some(kind);
            inner.descriptor = None;
            inner.state = State::Loading;
            inner.generation
        };

        let Some(id) = record.id.clone() else {
            warn!("Preview requested for a record without identity");
            self.finish(generation, Err(PreviewError::MetadataUnavailable));
            return;
        };

        debug!("Preview load {generation} for record {id} ({kind:?})");

        let descriptor = match self.backend.document_info(&id).await {
            Ok(descriptor) if descriptor.available => descriptor,
            Ok(_) => {
                self.finish(generation, Err(PreviewError::MetadataUnavailable));
                return;
            }
            Err(e) => {
                warn!("Document info lookup failed for {id}: {e}");
                self.finish(generation, Err(PreviewError::MetadataUnavailable));
                return;
            }
        };

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                debug!("Discarding stale descriptor for load {generation}");
                return;
            }
            inner.descriptor = Some(descriptor.clone());
        }

        let converted = match kind {
            DocumentKind::Pdf => false,
            DocumentKind::Word => {
                if !(descriptor.can_preview && self.conversion_supported) {
                    // `conversion_available` discriminates "cannot
                    // convert at all" from "attempted and failed".
                    let error = if descriptor.conversion_available {
                        PreviewError::ConversionFailed
                    } else {
                        PreviewError::ConversionUnavailable
                    };
                    self.finish(generation, Err(error));
                    return;
                }
                descriptor.needs_conversion
            }
            DocumentKind::Other => {
                self.finish(generation, Err(PreviewError::UnsupportedFormat));
                return;
            }
        };

        match self.backend.document_payload(&id).await {
            Ok(payload) if payload.is_empty() => {
                self.finish(generation, Err(PreviewError::EmptyPayload));
            }
            Ok(payload) => {
                info!("Preview ready for record {id}: {} bytes", payload.len());
                self.finish(generation, Ok((payload, converted)));
            }
            Err(e) => {
                warn!("Document payload fetch failed for {id}: {e}");
                self.finish(generation, Err(PreviewError::Network(e.user_message())));
            }
        }
    }

    /// Releases the live resource and returns to `Idle`. Valid from any
    /// state; also invalidates every in-flight load.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        Self::release_current(&mut inner);
        inner.state = State::Idle;
        inner.kind = None;
        inner.descriptor = None;
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        let inner = self.inner.lock().unwrap();
        let (phase, converted, error, resource) = match &inner.state {
            State::Idle => (PreviewPhase::Idle, false, None, None),
            State::Loading => (PreviewPhase::Loading, false, None, None),
            State::Ready { handle, converted } => {
                (PreviewPhase::Ready, *converted, None, Some(handle.id()))
            }
            State::Failed(error) => (PreviewPhase::Failed, false, Some(error.clone()), None),
        };
        PreviewSnapshot { phase, kind: inner.kind, converted, error, resource }
    }

    /// Displayable bytes for the currently live resource.
    pub fn resource_bytes(&self, id: ResourceId) -> Option<Bytes> {
        self.inner.lock().unwrap().pool.bytes(id).cloned()
    }

    pub fn descriptor(&self) -> Option<DocumentDescriptor> {
        self.inner.lock().unwrap().descriptor.clone()
    }

    /// `(acquired, released, live)` resource accounting.
    pub fn resource_stats(&self) -> (u64, u64, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.pool.acquired(), inner.pool.released(), inner.pool.live())
    }

    /// Applies a load outcome if (and only if) it is still the most
    /// recent load issued. The previously held handle is released
    /// before a new one is acquired.
    fn finish(&self, generation: u64, outcome: Result<(Bytes, bool), PreviewError>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.generation != generation {
            debug!("Discarding stale result for load {generation}");
            return;
        }
        Self::release_current(&mut inner);
        inner.state = match outcome {
            Ok((payload, converted)) => {
                let handle = inner.pool.acquire(payload);
                State::Ready { handle, converted }
            }
            Err(error) => State::Failed(error),
        };
    }

    fn release_current(inner: &mut Inner) {
        if let State::Ready { handle, .. } = std::mem::replace(&mut inner.state, State::Idle) {
            inner.pool.release(handle);
        }
    }
}

/// Drives the controller from the record store: reloads on every record
/// change, tears down when the store empties. The watch receiver only
/// retains the newest value, so a burst of record swaps settles into a
/// single reload of the last one.
pub async fn watch_current_record(controller: &DocumentPreviewController, store: &RecordStore) {
    let mut rx = store.subscribe();
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let record = rx.borrow_and_update().clone();
        match record {
            Some(record) => controller.load_preview(&record).await,
            None => controller.teardown(),
        }
    }
}
