//! File metadata as it flows between the file transfer, the editor and the
//! document store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field written when the host does not pick one.
pub const DEFAULT_FIELD: &str = "images";

fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}

/// One user-supplied file and its processed variants.
///
/// `temporary_url` is a client-side preview handle and is never serialized,
/// so it cannot leak into the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub collection: String,
    pub document: String,
    #[serde(default = "default_field")]
    pub field: String,
    pub extension: String,
    pub filename: String,
    /// Unique key inside a [`FileRecordSet`].
    pub name: String,
    /// Position in multi-file mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub size: u64,
    pub size_str: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default, skip_serializing)]
    pub temporary_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl FileRecord {
    /// True once the optimized variant has a non-empty reference.
    pub fn is_optimized(&self) -> bool {
        self.optimized.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Current files of an editor, keyed by [`FileRecord::name`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRecordSet(BTreeMap<String, FileRecord>);

impl FileRecordSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.0.values()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileRecord> {
        self.0.get_mut(name)
    }

    /// Inserts under the record's own name, returning the record it replaced.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileRecord> {
        self.0.insert(record.name.clone(), record)
    }

    pub fn remove(&mut self, name: &str) -> Option<FileRecord> {
        self.0.remove(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Records in display order: by `index`, unindexed last, ties by name.
    pub fn ordered(&self) -> Vec<&FileRecord> {
        let mut records: Vec<&FileRecord> = self.0.values().collect();
        records.sort_by(|a, b| {
            let ka = a.index.unwrap_or(u32::MAX);
            let kb = b.index.unwrap_or(u32::MAX);
            ka.cmp(&kb).then_with(|| a.name.cmp(&b.name))
        });
        records
    }
}

impl FromIterator<FileRecord> for FileRecordSet {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut set = FileRecordSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl IntoIterator for FileRecordSet {
    type Item = FileRecord;
    type IntoIter = std::collections::btree_map::IntoValues<String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}
