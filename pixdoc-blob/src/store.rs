use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use pixdoc_core::DocumentStore;
use serde_json::{Map, Value};
use tracing::debug;

type DocumentKey = (String, String);

/// In-memory document store.
///
/// `set` merges top-level keys into the existing document; `delete_field`
/// removes a dotted path and is a no-op when the path or document is absent.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, Map<String, Value>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, document: &str) -> Option<Value> {
        let documents = self.documents.read();
        documents
            .get(&(collection.to_string(), document.to_string()))
            .map(|doc| Value::Object(doc.clone()))
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, collection: &str, document: &str, data: Value) -> Result<()> {
        let Value::Object(fields) = data else {
            anyhow::bail!("document data must be a JSON object, got {data}");
        };

        let mut documents = self.documents.write();
        let doc = documents
            .entry((collection.to_string(), document.to_string()))
            .or_default();
        for (key, value) in fields {
            doc.insert(key, value);
        }
        debug!(collection, document, "document written");
        Ok(())
    }

    async fn delete_field(&self, collection: &str, document: &str, field_path: &str) -> Result<()> {
        let segments: Vec<&str> = field_path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            anyhow::bail!("invalid field path: {field_path:?}");
        }

        let mut documents = self.documents.write();
        let Some(doc) = documents.get_mut(&(collection.to_string(), document.to_string())) else {
            return Ok(());
        };

        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut current = doc;
        for segment in parents {
            match current.get_mut(*segment) {
                Some(Value::Object(child)) => current = child,
                _ => return Ok(()),
            }
        }
        if current.remove(*last).is_some() {
            debug!(collection, document, field_path, "field deleted");
        }
        Ok(())
    }
}
