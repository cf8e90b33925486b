mod autosave;
mod backend;
mod config;
mod errors;
mod export;
mod models;
mod preview;
mod session;
mod store;
#[cfg(test)]
mod testutil;
mod upload;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::{CvBackend, HttpBackend};
use crate::config::Config;
use crate::preview::DocumentPreviewController;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvdesk v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", config.backend_url);

    let backend: Arc<dyn CvBackend> = Arc::new(HttpBackend::new(&config));

    // Probe the server's conversion capability once; Word previews hang
    // off this flag for the rest of the process.
    let conversion_supported = match backend.conversion_status().await {
        Ok(status) => {
            info!(
                "Server conversion available: {} (formats: {:?})",
                status.available, status.formats
            );
            status.available
        }
        Err(e) => {
            warn!("Conversion probe failed: {e}; Word previews disabled");
            false
        }
    };

    let store = Arc::new(RecordStore::new());
    let controller = DocumentPreviewController::new(backend.clone(), conversion_supported);

    // Smoke path: list what the backend holds and preview the first
    // record, so a misconfigured deployment surfaces immediately.
    let records = backend.list_records().await?;
    info!("{} record(s) on the backend", records.len());

    if let Some(first) = records.into_iter().next() {
        info!("Previewing {:?} ({:?})", first.id, first.original_filename);
        store.replace(first.clone());
        controller.load_preview(&first).await;
        let snapshot = controller.snapshot();
        info!("Preview state: {:?} (kind: {:?})", snapshot.phase, snapshot.kind);
        if let Some(error) = snapshot.error {
            info!("Preview message: {}", error.user_message());
        }
    }

    Ok(())
}
