use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::services::BusyIndicator;

/// Show `message`, drive `work`, then hide the indicator whatever `work`
/// resolved to.
///
/// If the returned future is dropped before `work` finishes (a timeout, a
/// lost `select!` branch, an aborted task, a panicking listener) the hide is
/// spawned on the current runtime instead.
pub async fn with_busy<F, T>(indicator: Arc<dyn BusyIndicator>, message: &str, work: F) -> T
where
    F: Future<Output = T>,
{
    let guard = HideOnDrop {
        indicator: Some(indicator.clone()),
    };
    indicator.show(message).await;
    let out = work.await;
    guard.release().await;
    out
}

struct HideOnDrop {
    indicator: Option<Arc<dyn BusyIndicator>>,
}

impl HideOnDrop {
    async fn release(mut self) {
        if let Some(indicator) = self.indicator.take() {
            indicator.hide().await;
        }
    }
}

impl Drop for HideOnDrop {
    fn drop(&mut self) {
        let Some(indicator) = self.indicator.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                debug!("busy scope dropped early, hiding in the background");
                handle.spawn(async move { indicator.hide().await });
            }
            Err(_) => warn!("busy scope dropped outside a runtime, indicator left visible"),
        }
    }
}

/// In-process busy indicator: an active flag plus the current message,
/// with show/hide counters for hosts that poll it.
#[derive(Debug, Default)]
pub struct Spinner {
    state: Mutex<SpinnerState>,
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SpinnerState {
    active: bool,
    message: Option<String>,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn message(&self) -> Option<String> {
        self.state.lock().message.clone()
    }

    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    pub fn hidden(&self) -> usize {
        self.hidden.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BusyIndicator for Spinner {
    async fn show(&self, message: &str) {
        {
            let mut state = self.state.lock();
            state.active = true;
            state.message = Some(message.to_string());
        }
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    async fn hide(&self) {
        {
            let mut state = self.state.lock();
            state.active = false;
            state.message = None;
        }
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}
