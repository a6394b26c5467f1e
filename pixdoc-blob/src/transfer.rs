use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use pixdoc_core::{EditorConfig, FileRecord, FileRecordSet, FileTransfer, TransferEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TransferConfig;
use crate::error::{TransferError, TransferResult};
use crate::size::format_size;
use crate::types::{split_file_name, FileUpload, ProcessedVariants};

/// File transfer that stages files under the editor's temporary collection.
///
/// Records live in memory until they are deleted. Every mutation publishes
/// its specific event first and then the full set as
/// [`TransferEvent::RecordsChanged`].
pub struct StagingTransfer {
    collection: String,
    document: String,
    field: String,
    temporary_collection: String,
    allow_multiple: bool,
    config: TransferConfig,
    records: RwLock<FileRecordSet>,
    events: broadcast::Sender<TransferEvent>,
}

impl StagingTransfer {
    pub fn new(editor: &EditorConfig, config: TransferConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            collection: editor.collection.clone(),
            document: editor.document.clone(),
            field: editor.field.clone(),
            temporary_collection: editor.temporary_collection_name(),
            allow_multiple: editor.allow_multiple,
            config,
            records: RwLock::new(FileRecordSet::new()),
            events,
        }
    }

    fn publish(&self, event: TransferEvent) {
        debug!(event = event.event_name(), "transfer event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn publish_records(&self, records: FileRecordSet) {
        self.publish(TransferEvent::RecordsChanged(records));
    }

    /// Stage a new file. In single-file mode the previous record is dropped
    /// and announced with [`TransferEvent::FileDeleted`].
    pub fn add_file(&self, upload: FileUpload) -> TransferResult<FileRecord> {
        if upload.original_name.trim().is_empty() {
            return Err(TransferError::invalid("file name is empty"));
        }
        if !self.config.accepts(&upload.mime_type) {
            warn!(file = %upload.original_name, mime_type = %upload.mime_type, "file type not accepted");
            return Err(TransferError::rejected(format!(
                "{} is not an accepted file type",
                upload.mime_type
            )));
        }
        if upload.size > self.config.max_file_bytes {
            warn!(file = %upload.original_name, size = upload.size, "file too large");
            return Err(TransferError::rejected(format!(
                "{} exceeds the {} limit",
                format_size(upload.size),
                format_size(self.config.max_file_bytes)
            )));
        }

        let name = Uuid::new_v4().simple().to_string();
        let (_, extension) = split_file_name(&upload.original_name);
        let filename = if extension.is_empty() {
            name.clone()
        } else {
            format!("{name}.{extension}")
        };

        let (record, replaced, snapshot) = {
            let mut records = self.records.write();
            let replaced: Vec<String> = if self.allow_multiple {
                Vec::new()
            } else {
                let names: Vec<String> = records.names().map(str::to_string).collect();
                for old in &names {
                    records.remove(old);
                }
                names
            };
            let index = self.allow_multiple.then(|| {
                records
                    .iter()
                    .filter_map(|r| r.index)
                    .max()
                    .map_or(0, |max| max + 1)
            });

            let record = FileRecord {
                collection: self.collection.clone(),
                document: self.document.clone(),
                field: self.field.clone(),
                extension,
                filename,
                name: name.clone(),
                index,
                size: upload.size,
                size_str: format_size(upload.size),
                mime_type: upload.mime_type.clone(),
                temporary_url: Some(format!("blob:{}/{}", self.temporary_collection, name)),
                optimized: None,
                original: None,
                thumbnail: None,
            };
            records.insert(record.clone());
            (record, replaced, records.clone())
        };

        info!(
            name = %record.name,
            file = %upload.original_name,
            size = %record.size_str,
            "file received"
        );
        for old in replaced {
            debug!(name = %old, "replaced in single-file mode");
            self.publish(TransferEvent::FileDeleted { name: old });
        }
        self.publish(TransferEvent::FileReceived {
            name: record.name.clone(),
        });
        self.publish_records(snapshot);
        Ok(record)
    }

    /// Attach processed variant references to a staged record.
    pub fn complete_upload(
        &self,
        name: &str,
        variants: ProcessedVariants,
    ) -> TransferResult<FileRecord> {
        if variants.optimized.is_empty() {
            return Err(TransferError::invalid("optimized reference is empty"));
        }

        let (record, snapshot) = {
            let mut records = self.records.write();
            let record = records
                .get_mut(name)
                .ok_or_else(|| TransferError::not_found(name))?;
            record.optimized = Some(variants.optimized);
            record.original = variants.original;
            record.thumbnail = variants.thumbnail;
            let record = record.clone();
            (record, records.clone())
        };

        info!(name, "upload complete");
        self.publish(TransferEvent::FileUploaded {
            record: record.clone(),
        });
        self.publish_records(snapshot);
        Ok(record)
    }

    /// Drop a record whose upload has not finished yet.
    pub fn cancel_upload(&self, name: &str) -> TransferResult<()> {
        let snapshot = {
            let mut records = self.records.write();
            match records.get(name) {
                None => return Err(TransferError::not_found(name)),
                Some(record) if record.is_optimized() => {
                    return Err(TransferError::invalid(format!(
                        "upload of {name} already completed"
                    )))
                }
                Some(_) => {}
            }
            records.remove(name);
            records.clone()
        };

        info!(name, "upload cancelled");
        self.publish(TransferEvent::UploadCancelled {
            name: name.to_string(),
        });
        self.publish_records(snapshot);
        Ok(())
    }

    /// Rewrite positions in multi-file mode. `names` must list every staged
    /// record exactly once.
    pub fn reorder<S: AsRef<str>>(&self, names: &[S]) -> TransferResult<()> {
        if !self.allow_multiple {
            return Err(TransferError::invalid(
                "reordering needs multi-file mode",
            ));
        }

        let snapshot = {
            let mut records = self.records.write();
            let unique: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
            if unique.len() != names.len()
                || names.len() != records.len()
                || !unique.iter().all(|n| records.contains(n))
            {
                return Err(TransferError::invalid(
                    "order must name every staged file exactly once",
                ));
            }
            for (position, name) in names.iter().enumerate() {
                if let Some(record) = records.get_mut(name.as_ref()) {
                    record.index = Some(position as u32);
                }
            }
            records.clone()
        };

        debug!(count = names.len(), "records reordered");
        self.publish_records(snapshot);
        Ok(())
    }

    fn remove(&self, name: &str) -> TransferResult<FileRecord> {
        let (record, snapshot) = {
            let mut records = self.records.write();
            let record = records
                .remove(name)
                .ok_or_else(|| TransferError::not_found(name))?;
            (record, records.clone())
        };

        info!(name, "file deleted");
        self.publish(TransferEvent::FileDeleted {
            name: name.to_string(),
        });
        self.publish_records(snapshot);
        Ok(record)
    }
}

#[async_trait]
impl FileTransfer for StagingTransfer {
    fn get_data(&self) -> FileRecordSet {
        self.records.read().clone()
    }

    async fn delete(&self, name: &str) -> Result<FileRecord> {
        Ok(self.remove(name)?)
    }

    async fn delete_all(&self) -> Result<()> {
        let removed = std::mem::take(&mut *self.records.write());
        info!(count = removed.len(), "all files deleted");
        for record in removed {
            self.publish(TransferEvent::FileDeleted { name: record.name });
        }
        self.publish_records(FileRecordSet::new());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> StagingTransfer {
        let config = EditorConfig::new("cms", "home").with_field("heroImg");
        StagingTransfer::new(&config, TransferConfig::default())
    }

    fn multi() -> StagingTransfer {
        let config = EditorConfig::new("cms", "gallery").with_allow_multiple(true);
        StagingTransfer::new(&config, TransferConfig::default())
    }

    fn png(name: &str) -> FileUpload {
        FileUpload::new(name, "image/png", 52_431)
    }

    fn drain(rx: &mut broadcast::Receiver<TransferEvent>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.event_name());
        }
        names
    }

    #[test]
    fn add_file_builds_staged_record() {
        let transfer = single();
        let record = transfer.add_file(png("Hero Shot.PNG")).unwrap();

        assert_eq!(record.collection, "cms");
        assert_eq!(record.document, "home");
        assert_eq!(record.field, "heroImg");
        assert_eq!(record.extension, "png");
        assert_eq!(record.filename, format!("{}.png", record.name));
        assert_eq!(record.name.len(), 32);
        assert_eq!(record.size_str, "51.20 KB");
        assert_eq!(record.index, None);
        assert_eq!(
            record.temporary_url.as_deref(),
            Some(format!("blob:cms-editor-temp/{}", record.name).as_str())
        );
        assert!(!record.is_optimized());
        assert!(transfer.get_data().contains(&record.name));
    }

    #[test]
    fn single_mode_replaces_previous_file() {
        let transfer = single();
        let first = transfer.add_file(png("a.png")).unwrap();
        let mut rx = transfer.subscribe();
        let second = transfer.add_file(png("b.png")).unwrap();

        let data = transfer.get_data();
        assert_eq!(data.len(), 1);
        assert!(data.contains(&second.name));
        assert!(!data.contains(&first.name));
        assert_eq!(
            drain(&mut rx),
            vec!["file-deleted", "file-received", "records-changed"]
        );
    }

    #[test]
    fn multi_mode_appends_with_positions() {
        let transfer = multi();
        let a = transfer.add_file(png("a.png")).unwrap();
        let b = transfer.add_file(png("b.png")).unwrap();
        assert_eq!(a.index, Some(0));
        assert_eq!(b.index, Some(1));

        transfer.reorder(&[b.name.as_str(), a.name.as_str()]).unwrap();
        let data = transfer.get_data();
        let order: Vec<&str> = data.ordered().into_iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec![b.name.as_str(), a.name.as_str()]);
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let transfer = multi();
        let a = transfer.add_file(png("a.png")).unwrap();
        transfer.add_file(png("b.png")).unwrap();

        assert!(matches!(
            transfer.reorder(&[a.name.as_str()]),
            Err(TransferError::Invalid { .. })
        ));
        assert!(matches!(
            transfer.reorder(&[a.name.as_str(), a.name.as_str()]),
            Err(TransferError::Invalid { .. })
        ));
        assert!(matches!(
            single().reorder::<&str>(&[]),
            Err(TransferError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_non_images_and_oversized_files() {
        let transfer = single();
        assert!(matches!(
            transfer.add_file(FileUpload::new("doc.pdf", "application/pdf", 10)),
            Err(TransferError::Rejected { .. })
        ));

        let config = EditorConfig::new("cms", "home");
        let small = StagingTransfer::new(&config, TransferConfig::new().with_max_file_bytes(1024));
        assert!(matches!(
            small.add_file(png("big.png")),
            Err(TransferError::Rejected { .. })
        ));
        assert!(small.get_data().is_empty());
    }

    #[test]
    fn complete_then_cancel_is_refused() {
        let transfer = single();
        let record = transfer.add_file(png("a.png")).unwrap();
        let mut rx = transfer.subscribe();

        let done = transfer
            .complete_upload(
                &record.name,
                ProcessedVariants::new("https://cdn/a-opt.png").with_thumbnail("https://cdn/a-t.png"),
            )
            .unwrap();
        assert!(done.is_optimized());
        assert_eq!(drain(&mut rx), vec!["file-uploaded", "records-changed"]);

        assert!(matches!(
            transfer.cancel_upload(&record.name),
            Err(TransferError::Invalid { .. })
        ));
        assert!(matches!(
            transfer.complete_upload("nope", ProcessedVariants::new("x")),
            Err(TransferError::NotFound { .. })
        ));
    }

    #[test]
    fn cancel_removes_pending_upload() {
        let transfer = single();
        let record = transfer.add_file(png("a.png")).unwrap();
        let mut rx = transfer.subscribe();

        transfer.cancel_upload(&record.name).unwrap();
        assert!(transfer.get_data().is_empty());
        assert_eq!(drain(&mut rx), vec!["upload-cancelled", "records-changed"]);
    }

    #[tokio::test]
    async fn delete_unknown_name_is_not_found() {
        let transfer = single();
        let err = transfer.delete("ghost").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransferError>(),
            Some(TransferError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_all_announces_each_file_then_the_set() {
        let transfer = multi();
        transfer.add_file(png("a.png")).unwrap();
        transfer.add_file(png("b.png")).unwrap();
        let mut rx = transfer.subscribe();

        transfer.delete_all().await.unwrap();
        assert!(transfer.get_data().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec!["file-deleted", "file-deleted", "records-changed"]
        );
    }
}
