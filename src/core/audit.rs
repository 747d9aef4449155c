//! Audit trail of scheduling decisions.
//!
//! The allocator and the kernel report lifecycle events (spawn, dispatch,
//! yield, release, exit) to an optional sink. The in-memory sink keeps a
//! bounded buffer and can be cloned, so a test or a diagnostic tool can keep a
//! handle while the kernel owns another.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Scheduling event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A logical thread was created.
    Spawn,
    /// A thread obtained a CPU token.
    Dispatch,
    /// A thread handed its token to a ready thread in `defer`.
    Yield,
    /// A thread returned its token to the pool.
    Release,
    /// A thread's entry point returned.
    Exit,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Position of the event in the trail.
    pub seq: u64,
    /// Name (or id) of the thread the event is about.
    pub thread: String,
    /// Action taken.
    pub action: AuditAction,
    /// Free tokens right after the action.
    pub free_tokens: usize,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Shared handle to a boxed sink, as stored by the kernel.
pub type SharedAuditSink = Arc<Mutex<Box<dyn AuditSink>>>;

/// In-memory audit sink for testing and dev.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Names of the threads with events of `action`, in trail order.
    #[must_use]
    pub fn threads_for(&self, action: AuditAction) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == action)
            .map(|event| event.thread.clone())
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Audit front-end shared by the allocator and the kernel: numbers events
/// and forwards them to the sink, if any.
#[derive(Clone, Default)]
pub(crate) struct AuditTrail {
    sink: Option<SharedAuditSink>,
    seq: Arc<AtomicU64>,
}

impl AuditTrail {
    pub(crate) fn new(sink: Option<SharedAuditSink>) -> Self {
        Self {
            sink,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub(crate) fn record(
        &self,
        thread: impl Into<String>,
        action: AuditAction,
        free_tokens: usize,
        payload: Option<String>,
    ) {
        if let Some(sink) = &self.sink {
            let event = build_audit_event(
                self.seq.fetch_add(1, Ordering::Relaxed),
                thread,
                action,
                free_tokens,
                payload,
            );
            sink.lock().record(event);
        }
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    seq: u64,
    thread: impl Into<String>,
    action: AuditAction,
    free_tokens: usize,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        seq,
        thread: thread.into(),
        action,
        free_tokens,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_is_bounded() {
        let mut sink = InMemoryAuditSink::new(2);
        for seq in 0..3 {
            sink.record(build_audit_event(seq, "t", AuditAction::Dispatch, 0, None));
        }
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[1].seq, 2);
    }

    #[test]
    fn test_trail_numbers_events_and_shares_buffer() {
        let sink = InMemoryAuditSink::new(16);
        let shared: SharedAuditSink = Arc::new(Mutex::new(Box::new(sink.clone())));
        let trail = AuditTrail::new(Some(shared));

        trail.record("a", AuditAction::Spawn, 1, None);
        trail.record("a", AuditAction::Dispatch, 0, Some("first".into()));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 0);
        assert_eq!(events[1].seq, 1);
        assert_eq!(events[1].payload.as_deref(), Some("first"));
        assert_eq!(sink.threads_for(AuditAction::Dispatch), vec!["a".to_string()]);
    }

    #[test]
    fn test_trail_without_sink_is_silent() {
        let trail = AuditTrail::default();
        trail.record("a", AuditAction::Exit, 1, None);
    }

    #[test]
    fn test_event_serializes_action_snake_case() {
        let event = build_audit_event(0, "idler", AuditAction::Yield, 1, None);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"action\":\"yield\""));
    }
}
