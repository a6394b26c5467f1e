use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::errors::{EditorError, EditorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Events the editor itself originates.
///
/// File received/uploaded/deleted and upload-cancelled belong to the file
/// transfer (see [`crate::TransferEvent`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorEventKind {
    ReadinessChanged,
    SaveComplete,
}

impl EditorEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEventKind::ReadinessChanged => "readiness-changed",
            EditorEventKind::SaveComplete => "save-complete",
        }
    }
}

/// Data delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EditorEvent {
    ReadinessChanged { value: bool },
    SaveComplete,
}

impl EditorEvent {
    pub fn kind(&self) -> EditorEventKind {
        match self {
            EditorEvent::ReadinessChanged { .. } => EditorEventKind::ReadinessChanged,
            EditorEvent::SaveComplete => EditorEventKind::SaveComplete,
        }
    }
}

/// Listener signature. Dispatch is synchronous.
pub type EventListener = Arc<dyn Fn(&EditorEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPat {
    Any,
    Exact(EditorEventKind),
}

impl EventPat {
    pub fn matches(&self, kind: EditorEventKind) -> bool {
        match self {
            EventPat::Any => true,
            EventPat::Exact(k) => *k == kind,
        }
    }
}

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    pattern: EventPat,
    listener: EventListener,
    once: bool,
}

/// Listener registry for editor events.
///
/// The editor keeps the hub behind a lock, so emission is split in two:
/// 1) snapshot matching listeners (read lock)
/// 2) call them with no lock held, then drop fired `once` listeners (write lock)
///
/// A listener may therefore subscribe or unsubscribe from inside a callback.
#[derive(Default)]
pub struct EditorEventHub {
    listeners: Vec<ListenerEntry>,
}

impl EditorEventHub {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn on(&mut self, kind: EditorEventKind, listener: EventListener) -> ListenerId {
        self.on_pattern(EventPat::Exact(kind), listener)
    }

    pub fn on_pattern(&mut self, pattern: EventPat, listener: EventListener) -> ListenerId {
        self.push(pattern, listener, false)
    }

    pub fn once(&mut self, kind: EditorEventKind, listener: EventListener) -> ListenerId {
        self.push(EventPat::Exact(kind), listener, true)
    }

    fn push(&mut self, pattern: EventPat, listener: EventListener, once: bool) -> ListenerId {
        let id = next_listener_id();
        self.listeners.push(ListenerEntry {
            id,
            pattern,
            listener,
            once,
        });
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|e| e.id != id);
        before != self.listeners.len()
    }

    /// Remove every listener, or only those registered with `pattern`.
    pub fn remove_all(&mut self, pattern: Option<&EventPat>) -> usize {
        let before = self.listeners.len();
        if let Some(p) = pattern {
            self.listeners.retain(|e| &e.pattern != p);
        } else {
            self.listeners.clear();
        }
        before - self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Phase 1: listeners to call, plus the `once` ids to drop afterwards.
    pub fn snapshot_emit(&self, event: &EditorEvent) -> (Vec<EventListener>, Vec<ListenerId>) {
        let kind = event.kind();
        let mut to_call = Vec::new();
        let mut once_ids = Vec::new();

        for entry in &self.listeners {
            if entry.pattern.matches(kind) {
                to_call.push(entry.listener.clone());
                if entry.once {
                    once_ids.push(entry.id);
                }
            }
        }

        (to_call, once_ids)
    }

    /// Phase 2 cleanup.
    pub fn finalize_once_removals(&mut self, once_ids: &[ListenerId]) {
        if once_ids.is_empty() {
            return;
        }
        self.listeners.retain(|e| !once_ids.contains(&e.id));
    }
}

/// Parse `"readiness-changed"`, `"save-complete"` or `"*"`.
pub fn parse_event_pattern(input: &str) -> EditorResult<EventPat> {
    let s = input.trim();
    if s == "*" {
        return Ok(EventPat::Any);
    }
    parse_event_kind(s).map(EventPat::Exact)
}

pub fn parse_event_kind(s: &str) -> EditorResult<EditorEventKind> {
    match s.trim().to_lowercase().as_str() {
        "readiness-changed" => Ok(EditorEventKind::ReadinessChanged),
        "save-complete" => Ok(EditorEventKind::SaveComplete),
        other => Err(EditorError::unknown_event(other)),
    }
}
