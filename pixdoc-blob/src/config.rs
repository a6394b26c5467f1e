/// Configuration for the staging file transfer
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Largest single file accepted
    pub max_file_bytes: u64,

    /// MIME prefix a file must carry to be accepted (`image/` by default)
    pub accepted_mime_prefix: String,

    /// Capacity of the transfer event channel
    pub event_capacity: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024, // 20MB
            accepted_mime_prefix: "image/".to_string(),
            event_capacity: 256,
        }
    }
}

impl TransferConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    /// Accept any MIME type starting with `prefix`; empty accepts everything
    pub fn with_accepted_mime_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.accepted_mime_prefix = prefix.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub(crate) fn accepts(&self, mime_type: &str) -> bool {
        mime_type
            .to_ascii_lowercase()
            .starts_with(&self.accepted_mime_prefix.to_ascii_lowercase())
    }
}
