//! pixdoc-core: framework-agnostic core for the pixdoc image-field editor.
//!
//! The editor lets a host add, preview, reorder, upload, optimize and delete
//! images whose metadata lives in one field of a document. Everything heavy
//! (transport, resizing, storage) sits behind collaborator traits; this crate
//! owns the readiness signal, the save/delete lifecycle and its events.

pub mod busy;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod errors;
pub mod events;
pub mod readiness;
pub mod record;
pub mod services;

pub use busy::{with_busy, Spinner};
pub use config::{EditorConfig, Settings, SettingsSnapshot};
pub use debounce::Debouncer;
pub use editor::ImageEditor;
pub use errors::{EditorError, EditorResult, ErrorKind};
pub use events::{EditorEvent, EditorEventHub, EditorEventKind, EventListener, EventPat, ListenerId};
pub use readiness::{is_ready, ReadinessTracker};
pub use record::{FileRecord, FileRecordSet, DEFAULT_FIELD};
pub use services::{
    BusyIndicator, DocumentStore, FileTransfer, NoopBusyIndicator, Toaster, TracingToaster,
    TransferEvent,
};
