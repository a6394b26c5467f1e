//! The image-field editor: mirrors the file transfer's records, derives
//! readiness, and runs the save/delete lifecycle.
//!
//! Every public operation has two faces:
//! - `save` / `delete` / `delete_all` never fail. Errors are logged, the user
//!   gets a generic warning, and the return value says what happened.
//! - `try_save` / `try_delete` / `try_delete_all` run the same lifecycle but
//!   hand the error back and leave user messaging to the caller.
//!
//! In both, the busy indicator is hidden exactly once per show.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::busy::with_busy;
use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::errors::{EditorError, EditorResult};
use crate::events::{
    parse_event_pattern, EditorEvent, EditorEventHub, EditorEventKind, EventListener, ListenerId,
};
use crate::readiness::{is_ready, ReadinessTracker};
use crate::record::{FileRecord, FileRecordSet};
use crate::services::{
    BusyIndicator, DocumentStore, FileTransfer, NoopBusyIndicator, Toaster, TracingToaster,
    TransferEvent,
};

pub const SAVING_MESSAGE: &str = "Saving...";
pub const DELETING_ALL_MESSAGE: &str = "Deleting images...";
pub const IMAGE_SAVED: &str = "Image saved.";
pub const IMAGES_SAVED: &str = "Images saved.";
pub const IMAGE_DELETED: &str = "Image deleted.";
pub const IMAGES_DELETED: &str = "Images deleted.";
pub const UNEXPECTED_ERROR: &str = "Sorry, an unexpected error occurred!";

/// Records as last seen, together with the readiness derived from them.
struct Mirror {
    records: Arc<FileRecordSet>,
    readiness: ReadinessTracker,
}

pub struct ImageEditor {
    config: EditorConfig,
    transfer: Arc<dyn FileTransfer>,
    store: Arc<dyn DocumentStore>,
    busy: Arc<dyn BusyIndicator>,
    toaster: Arc<dyn Toaster>,
    mirror: Mutex<Mirror>,
    // held across commit and emit so listeners see transitions in commit order
    publish: ReentrantMutex<()>,
    events: RwLock<EditorEventHub>,
    debounce: Debouncer,
    // save/delete/delete_all run one at a time per editor
    op_lock: tokio::sync::Mutex<()>,
}

impl ImageEditor {
    pub fn new(
        config: EditorConfig,
        transfer: Arc<dyn FileTransfer>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let debounce = Debouncer::new(config.debounce);
        Self {
            config,
            transfer,
            store,
            busy: Arc::new(NoopBusyIndicator),
            toaster: Arc::new(TracingToaster),
            mirror: Mutex::new(Mirror {
                records: Arc::new(FileRecordSet::new()),
                readiness: ReadinessTracker::new(),
            }),
            publish: ReentrantMutex::new(()),
            events: RwLock::new(EditorEventHub::new()),
            debounce,
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_busy(mut self, busy: Arc<dyn BusyIndicator>) -> Self {
        self.busy = busy;
        self
    }

    pub fn with_toaster(mut self, toaster: Arc<dyn Toaster>) -> Self {
        self.toaster = toaster;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn temporary_collection_name(&self) -> String {
        self.config.temporary_collection_name()
    }

    /// Snapshot of the current records.
    pub fn get_data(&self) -> FileRecordSet {
        FileRecordSet::clone(&self.mirror.lock().records)
    }

    pub fn is_ready(&self) -> bool {
        is_ready(&self.mirror.lock().records)
    }

    // ──────────────────────────────────────────────────────────────
    // Events
    // ──────────────────────────────────────────────────────────────

    pub fn on(&self, kind: EditorEventKind, listener: EventListener) -> ListenerId {
        self.events.write().on(kind, listener)
    }

    /// `editor.on_str("readiness-changed", ...)`, or `"*"` for everything.
    pub fn on_str(&self, pattern: &str, listener: EventListener) -> EditorResult<ListenerId> {
        let pattern = parse_event_pattern(pattern)?;
        Ok(self.events.write().on_pattern(pattern, listener))
    }

    pub fn once(&self, kind: EditorEventKind, listener: EventListener) -> ListenerId {
        self.events.write().once(kind, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.write().off(id)
    }

    /// Drop every listener, or only those registered under `pattern`.
    pub fn off_all(&self, pattern: Option<&str>) -> EditorResult<usize> {
        let pattern = pattern.map(parse_event_pattern).transpose()?;
        Ok(self.events.write().remove_all(pattern.as_ref()))
    }

    fn emit(&self, event: EditorEvent) {
        let (listeners, once_ids) = {
            let hub = self.events.read();
            hub.snapshot_emit(&event)
        };

        for f in &listeners {
            f(&event);
        }

        self.events.write().finalize_once_removals(&once_ids);
    }

    // ──────────────────────────────────────────────────────────────
    // File transfer notifications
    // ──────────────────────────────────────────────────────────────

    /// Replace the mirrored set and announce a readiness transition.
    pub fn on_records_changed(&self, set: FileRecordSet) {
        let _publish = self.publish.lock();
        let change = {
            let mut guard = self.mirror.lock();
            let mirror = &mut *guard;
            mirror.records = Arc::new(set);
            mirror.readiness.observe(&mirror.records)
        };

        if let Some(value) = change {
            debug!(value, "readiness changed");
            self.emit(EditorEvent::ReadinessChanged { value });
        }
    }

    /// Pull the authoritative set from the file transfer.
    pub fn refresh(&self) {
        self.on_records_changed(self.transfer.get_data());
    }

    /// Drop `{field}.{name}` from the live document right away, without
    /// waiting for a save.
    #[instrument(skip(self), fields(collection = %self.config.collection, document = %self.config.document))]
    pub async fn sync_deleted_field(&self, name: &str) -> EditorResult<()> {
        let path = self.config.field_path(name);
        self.store
            .delete_field(&self.config.collection, &self.config.document, &path)
            .await
            .map_err(EditorError::store)?;
        debug!(%path, "field removed from document");
        Ok(())
    }

    pub async fn on_file_deleted(&self, name: &str) {
        if let Err(err) = self.sync_deleted_field(name).await {
            self.report_failure("sync_deleted_field", &err);
        }
    }

    pub async fn handle_transfer_event(&self, event: TransferEvent) {
        match event {
            // The payload may already be stale; the transfer's own view is not.
            TransferEvent::RecordsChanged(_) => self.refresh(),
            TransferEvent::FileDeleted { name } => self.on_file_deleted(&name).await,
            other => debug!(event = other.event_name(), "transfer event"),
        }
    }

    /// Compute the initial readiness and start forwarding transfer events.
    ///
    /// The task ends when the transfer drops its sender; abort the handle to
    /// detach earlier.
    pub fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.transfer.subscribe();
        self.refresh();

        let editor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => editor.handle_transfer_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "transfer events lagged, resyncing records");
                        editor.refresh();
                    }
                    Err(RecvError::Closed) => {
                        debug!("transfer event stream closed");
                        break;
                    }
                }
            }
        })
    }

    // ──────────────────────────────────────────────────────────────
    // Lifecycle
    // ──────────────────────────────────────────────────────────────

    fn payload(&self) -> EditorResult<Value> {
        let records = Arc::clone(&self.mirror.lock().records);
        let mut doc = Map::new();
        doc.insert(self.config.field.clone(), serde_json::to_value(&*records)?);
        Ok(Value::Object(doc))
    }

    fn saved_message(&self) -> &'static str {
        if self.config.allow_multiple {
            IMAGES_SAVED
        } else {
            IMAGE_SAVED
        }
    }

    fn report_failure(&self, operation: &'static str, err: &EditorError) {
        error!(operation, kind = err.kind().name(), error = %err, details = ?err, "image editor operation failed");
        self.toaster.warn(UNEXPECTED_ERROR);
    }

    /// Write `{field: records}` to the document, confirm, emit
    /// `save-complete`.
    #[instrument(skip(self), fields(collection = %self.config.collection, document = %self.config.document))]
    pub async fn try_save(&self) -> EditorResult<()> {
        let _op = self.op_lock.lock().await;

        with_busy(self.busy.clone(), SAVING_MESSAGE, async {
            let data = self.payload()?;
            self.store
                .set(&self.config.collection, &self.config.document, data)
                .await
                .map_err(EditorError::store)?;

            info!(field = %self.config.field, "images saved");
            self.toaster.toast(self.saved_message());
            self.emit(EditorEvent::SaveComplete);
            tokio::task::yield_now().await;
            Ok::<(), EditorError>(())
        })
        .await
    }

    /// Never fails; returns whether the save went through.
    pub async fn save(&self) -> bool {
        match self.try_save().await {
            Ok(()) => true,
            Err(err) => {
                self.report_failure("save", &err);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn try_delete(&self, name: &str) -> EditorResult<FileRecord> {
        if name.trim().is_empty() {
            return Err(EditorError::invalid_name(name));
        }
        let _op = self.op_lock.lock().await;

        let message = format!("Deleting {name} image...");
        with_busy(self.busy.clone(), &message, async {
            let record = self.transfer.delete(name).await.map_err(EditorError::transfer)?;
            self.refresh();

            info!(name, "image deleted");
            self.toaster.toast(IMAGE_DELETED);
            tokio::task::yield_now().await;
            Ok::<FileRecord, EditorError>(record)
        })
        .await
    }

    /// Never fails; `None` means the delete did not happen.
    pub async fn delete(&self, name: &str) -> Option<FileRecord> {
        match self.try_delete(name).await {
            Ok(record) => Some(record),
            Err(err) => {
                self.report_failure("delete", &err);
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn try_delete_all(&self) -> EditorResult<()> {
        let _op = self.op_lock.lock().await;

        with_busy(self.busy.clone(), DELETING_ALL_MESSAGE, async {
            self.transfer.delete_all().await.map_err(EditorError::transfer)?;
            self.refresh();

            info!("all images deleted");
            self.toaster.toast(IMAGES_DELETED);
            tokio::task::yield_now().await;
            Ok::<(), EditorError>(())
        })
        .await
    }

    /// Never fails; returns whether everything was deleted.
    pub async fn delete_all(&self) -> bool {
        match self.try_delete_all().await {
            Ok(()) => true,
            Err(err) => {
                self.report_failure("delete_all", &err);
                false
            }
        }
    }

    /// Save button handler. Clicks inside the debounce window are dropped
    /// silently.
    pub async fn on_save_clicked(&self) {
        if let Err(err) = self.debounce.try_claim() {
            if err.is_debounced() {
                debug!("save click debounced");
            } else {
                error!(error = ?err, "save click failed");
            }
            return;
        }
        self.save().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use tracing_test::traced_test;

    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        async fn set(&self, _collection: &str, _document: &str, _data: Value) -> anyhow::Result<()> {
            anyhow::bail!("store offline")
        }

        async fn delete_field(&self, _collection: &str, _document: &str, _path: &str) -> anyhow::Result<()> {
            anyhow::bail!("store offline")
        }
    }

    struct EmptyTransfer(broadcast::Sender<TransferEvent>);

    #[async_trait]
    impl FileTransfer for EmptyTransfer {
        fn get_data(&self) -> FileRecordSet {
            FileRecordSet::new()
        }

        async fn delete(&self, name: &str) -> anyhow::Result<FileRecord> {
            anyhow::bail!("no such file: {name}")
        }

        async fn delete_all(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
            self.0.subscribe()
        }
    }

    fn editor() -> ImageEditor {
        let (tx, _) = broadcast::channel(4);
        ImageEditor::new(
            EditorConfig::new("cms", "home"),
            Arc::new(EmptyTransfer(tx)),
            Arc::new(DownStore),
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_logged_with_their_operation() {
        let editor = editor();
        assert!(!editor.save().await);
        assert!(logs_contain("image editor operation failed"));
        assert!(logs_contain("store offline"));
    }

    #[tokio::test]
    #[traced_test]
    async fn debounced_clicks_are_not_reported_as_failures() {
        let editor = editor();
        editor.on_save_clicked().await;
        editor.on_save_clicked().await;
        assert!(logs_contain("save click debounced"));
        assert!(!logs_contain("save click failed"));
    }

    #[test]
    fn payload_nests_records_under_the_field() {
        let editor = editor();
        assert_eq!(editor.payload().unwrap(), serde_json::json!({ "images": {} }));
        assert_eq!(editor.temporary_collection_name(), "cms-editor-temp");
    }
}
