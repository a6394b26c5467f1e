//! # pixdoc-blob: reference collaborators for the pixdoc editor
//!
//! `pixdoc-core` only talks to traits. This crate provides working
//! implementations for headless hosts, demos and tests:
//!
//! - [`StagingTransfer`]: a [`FileTransfer`](pixdoc_core::FileTransfer) that
//!   stages incoming files under the editor's temporary collection, tracks
//!   their processed variants and publishes transfer events
//! - [`MemoryDocumentStore`]: a [`DocumentStore`](pixdoc_core::DocumentStore)
//!   keeping JSON documents in memory with merge-on-set and dotted-path
//!   field deletes
//!
//! ```rust
//! use std::sync::Arc;
//! use pixdoc_blob::prelude::*;
//! use pixdoc_core::{EditorConfig, ImageEditor};
//!
//! let config = EditorConfig::new("cms", "home").with_field("heroImg");
//! let transfer = Arc::new(StagingTransfer::new(&config, TransferConfig::default()));
//! let store = Arc::new(MemoryDocumentStore::new());
//! let editor = ImageEditor::new(config, transfer.clone(), store.clone());
//!
//! let record = transfer
//!     .add_file(FileUpload::new("hero.PNG", "image/png", 52_431))
//!     .unwrap();
//! assert_eq!(record.extension, "png");
//! # let _ = editor;
//! ```

mod config;
mod error;
mod size;
mod store;
mod transfer;
mod types;

pub use config::TransferConfig;
pub use error::{TransferError, TransferResult};
pub use size::format_size;
pub use store::MemoryDocumentStore;
pub use transfer::StagingTransfer;
pub use types::{split_file_name, FileUpload, ProcessedVariants};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        FileUpload, MemoryDocumentStore, ProcessedVariants, StagingTransfer, TransferConfig,
        TransferError, TransferResult,
    };
}
