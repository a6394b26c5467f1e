//! Capabilities the editor consumes. Hosts inject implementations at
//! construction; nothing is looked up by name.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::record::{FileRecord, FileRecordSet};

/// Document database client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `data` into `collection/document`.
    async fn set(&self, collection: &str, document: &str, data: Value) -> Result<()>;

    /// Remove one dotted field path (`images.abc123`) from a document.
    async fn delete_field(&self, collection: &str, document: &str, field_path: &str) -> Result<()>;
}

/// Notifications published by a [`FileTransfer`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    FileReceived { name: String },
    FileUploaded { record: FileRecord },
    FileDeleted { name: String },
    UploadCancelled { name: String },
    /// Full current set after any change.
    RecordsChanged(FileRecordSet),
}

impl TransferEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::FileReceived { .. } => "file-received",
            Self::FileUploaded { .. } => "file-uploaded",
            Self::FileDeleted { .. } => "file-deleted",
            Self::UploadCancelled { .. } => "upload-cancelled",
            Self::RecordsChanged(_) => "records-changed",
        }
    }
}

/// Upload/optimize/delete orchestration with its own staging storage.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    fn get_data(&self) -> FileRecordSet;

    /// Remove one record (and its staged assets), returning it.
    async fn delete(&self, name: &str) -> Result<FileRecord>;

    async fn delete_all(&self) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<TransferEvent>;
}

/// Busy overlay shown while an operation runs.
#[async_trait]
pub trait BusyIndicator: Send + Sync {
    async fn show(&self, message: &str);
    async fn hide(&self);
}

/// Transient user-facing messages.
pub trait Toaster: Send + Sync {
    fn toast(&self, message: &str);
    fn warn(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBusyIndicator;

#[async_trait]
impl BusyIndicator for NoopBusyIndicator {
    async fn show(&self, _message: &str) {}
    async fn hide(&self) {}
}

/// Sends user messages to the log; the default for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn toast(&self, message: &str) {
        info!(target: "pixdoc::toast", "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(target: "pixdoc::toast", "{message}");
    }
}
