use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::errors::{EditorError, EditorResult};

/// Leading-edge debounce: the first trigger passes, later ones inside the
/// window are refused with [`EditorError::Debounced`].
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn try_claim(&self) -> EditorResult<()> {
        let now = Instant::now();
        let mut last = self.last.lock();
        if let Some(prev) = *last {
            if now.duration_since(prev) < self.window {
                return Err(EditorError::Debounced);
            }
        }
        *last = Some(now);
        Ok(())
    }
}
