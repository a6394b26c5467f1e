use serde::{Deserialize, Serialize};

/// A file handed to the transfer by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Name as picked on the user's machine (`Holiday Photo.JPG`)
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileUpload {
    pub fn new<N, M>(original_name: N, mime_type: M, size: u64) -> Self
    where
        N: Into<String>,
        M: Into<String>,
    {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Durable references produced once a file has been processed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedVariants {
    pub optimized: String,
    pub original: Option<String>,
    pub thumbnail: Option<String>,
}

impl ProcessedVariants {
    pub fn new<S: Into<String>>(optimized: S) -> Self {
        Self {
            optimized: optimized.into(),
            original: None,
            thumbnail: None,
        }
    }

    pub fn with_original<S: Into<String>>(mut self, url: S) -> Self {
        self.original = Some(url.into());
        self
    }

    pub fn with_thumbnail<S: Into<String>>(mut self, url: S) -> Self {
        self.thumbnail = Some(url.into());
        self
    }
}

/// Split `photo.final.JPG` into (`photo.final`, `jpg`). No dot, a leading
/// dot only, or a trailing dot yield an empty extension.
pub fn split_file_name(original: &str) -> (String, String) {
    let trimmed = original.trim();
    match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem.to_string(), ext.to_ascii_lowercase())
        }
        _ => (trimmed.to_string(), String::new()),
    }
}
