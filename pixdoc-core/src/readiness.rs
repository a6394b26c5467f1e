use crate::record::{FileRecord, FileRecordSet};

/// A set is ready to persist when it is non-empty and every record has an
/// optimized variant. An empty set is never ready.
pub fn is_ready(set: &FileRecordSet) -> bool {
    !set.is_empty() && set.iter().all(FileRecord::is_optimized)
}

/// Remembers the last readiness value so callers only hear about transitions.
#[derive(Debug, Default)]
pub struct ReadinessTracker {
    last: Option<bool>,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last observed value, `None` before the first observation.
    pub fn current(&self) -> Option<bool> {
        self.last
    }

    /// Recompute for `set`. Returns the new value when it differs from the
    /// previous one; the first observation always returns `Some`.
    pub fn observe(&mut self, set: &FileRecordSet) -> Option<bool> {
        let ready = is_ready(set);
        if self.last == Some(ready) {
            return None;
        }
        self.last = Some(ready);
        Some(ready)
    }
}
