//! Session allocation and at-most-once reply continuations.
//!
//! A session is one outstanding request. The manager owns each pending
//! continuation exclusively until it fires or is cancelled; whichever
//! happens first wins, and any later event for the same ID is a no-op.

use core_types::SessionId;
use diagnostics::{DiagnosticSink, LogEntry};
use ipc::Args;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// First session ID allocated by a fresh manager.
pub const FIRST_SESSION_ID: u64 = 1000;

/// Continuation invoked with the reply arguments
pub type Continuation = Box<dyn FnOnce(Args)>;

struct PendingReply {
    /// Originating message name, kept for diagnostics only
    message: String,
    continuation: Continuation,
}

/// Allocates session IDs and holds pending reply continuations
///
/// IDs are strictly increasing and never reused for the lifetime of the
/// process. The pending map is private to this type; no other component
/// reads or writes it.
pub struct SessionManager {
    next_id: Cell<u64>,
    pending: RefCell<HashMap<SessionId, PendingReply>>,
    sink: Rc<dyn DiagnosticSink>,
}

impl SessionManager {
    /// Creates a manager reporting to `sink`
    pub fn new(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            next_id: Cell::new(FIRST_SESSION_ID),
            pending: RefCell::new(HashMap::new()),
            sink,
        }
    }

    /// Returns a fresh, strictly increasing session ID
    ///
    /// Has no side effect beyond advancing the counter.
    pub fn allocate(&self) -> SessionId {
        let raw = self.next_id.get();
        self.next_id.set(raw + 1);
        SessionId::from_raw(raw)
    }

    /// Stores the continuation for a session
    ///
    /// IDs are single-use, so an occupied slot indicates a sequencing bug
    /// in the caller: the collision is reported and the existing
    /// continuation is left untouched.
    pub fn register(&self, id: SessionId, message: &str, continuation: Continuation) {
        let mut pending = self.pending.borrow_mut();
        if let Some(existing) = pending.get(&id) {
            self.sink.record(
                LogEntry::error(
                    "sessions",
                    format!("{} already has a pending continuation", id),
                )
                .with_field("pending_message", existing.message.clone())
                .with_field("rejected_message", message),
            );
            return;
        }
        pending.insert(
            id,
            PendingReply {
                message: message.to_string(),
                continuation,
            },
        );
    }

    /// Fires the continuation for a session, if still pending
    ///
    /// The pending entry is removed before the continuation runs, so a
    /// reentrant fire or cancel for the same ID observes an empty slot.
    /// Unknown, already-fired, and cancelled IDs are a silent no-op;
    /// returns whether a continuation ran.
    pub fn fire(&self, id: SessionId, args: Args) -> bool {
        let entry = self.pending.borrow_mut().remove(&id);
        match entry {
            Some(pending) => {
                (pending.continuation)(args);
                true
            }
            None => false,
        }
    }

    /// Discards the pending continuation for a session without invoking it
    ///
    /// Idempotent; a subsequent [`SessionManager::fire`] for the same ID
    /// is a no-op.
    pub fn cancel(&self, id: SessionId) {
        self.pending.borrow_mut().remove(&id);
    }

    /// Returns whether a session is still awaiting its reply
    pub fn is_pending(&self, id: SessionId) -> bool {
        self.pending.borrow().contains_key(&id)
    }

    /// Returns the number of sessions awaiting replies
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::{LogLevel, MemorySink, NullSink};

    fn manager() -> SessionManager {
        SessionManager::new(Rc::new(NullSink))
    }

    #[test]
    fn test_allocation_starts_at_first_id() {
        let sessions = manager();
        assert_eq!(sessions.allocate(), SessionId::from_raw(1000));
        assert_eq!(sessions.allocate(), SessionId::from_raw(1001));
    }

    #[test]
    fn test_allocation_is_strictly_increasing() {
        let sessions = manager();
        let mut previous = sessions.allocate();
        for _ in 0..100 {
            let next = sessions.allocate();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_cancel_does_not_disturb_allocation() {
        let sessions = manager();
        let first = sessions.allocate();
        sessions.cancel(first);
        let second = sessions.allocate();
        assert!(second > first);
    }

    #[test]
    fn test_fire_invokes_continuation_once() {
        let sessions = manager();
        let id = sessions.allocate();
        let fired = Rc::new(Cell::new(0));

        let count = fired.clone();
        sessions.register(
            id,
            "version.get",
            Box::new(move |_args| count.set(count.get() + 1)),
        );

        assert!(sessions.fire(id, Args::new()));
        assert!(!sessions.fire(id, Args::new()));
        assert_eq!(fired.get(), 1);
        assert_eq!(sessions.pending_count(), 0);
    }

    #[test]
    fn test_fire_passes_reply_args() {
        let sessions = manager();
        let id = sessions.allocate();
        let received = Rc::new(RefCell::new(None));

        let slot = received.clone();
        sessions.register(
            id,
            "version.get",
            Box::new(move |args| *slot.borrow_mut() = Some(args)),
        );
        sessions.fire(id, Args::new().with_value("1.2.3"));

        let args = received.borrow_mut().take().unwrap();
        assert_eq!(args.get(0), Some(&serde_json::json!("1.2.3")));
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let sessions = manager();
        let id = sessions.allocate();
        let fired = Rc::new(Cell::new(false));

        let flag = fired.clone();
        sessions.register(id, "slow.op", Box::new(move |_args| flag.set(true)));

        sessions.cancel(id);
        assert!(!sessions.fire(id, Args::new()));
        assert!(!fired.get());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let sessions = manager();
        let id = sessions.allocate();
        sessions.register(id, "slow.op", Box::new(|_args| {}));
        sessions.cancel(id);
        sessions.cancel(id);
        assert!(!sessions.is_pending(id));
    }

    #[test]
    fn test_fire_unknown_id_is_noop() {
        let sessions = manager();
        assert!(!sessions.fire(SessionId::from_raw(9999), Args::new()));
    }

    #[test]
    fn test_reentrant_fire_observes_empty_slot() {
        let sessions = Rc::new(manager());
        let id = sessions.allocate();
        let inner_fired = Rc::new(Cell::new(false));

        let reentrant = sessions.clone();
        let flag = inner_fired.clone();
        sessions.register(
            id,
            "version.get",
            Box::new(move |_args| {
                // The slot is already empty, so this must be a no-op.
                flag.set(reentrant.fire(id, Args::new()));
                reentrant.cancel(id);
            }),
        );

        assert!(sessions.fire(id, Args::new()));
        assert!(!inner_fired.get());
    }

    #[test]
    fn test_duplicate_registration_keeps_existing() {
        let sink = Rc::new(MemorySink::new());
        let sessions = SessionManager::new(sink.clone());
        let id = sessions.allocate();
        let which = Rc::new(RefCell::new(""));

        let first = which.clone();
        sessions.register(id, "one", Box::new(move |_args| *first.borrow_mut() = "one"));
        let second = which.clone();
        sessions.register(id, "two", Box::new(move |_args| *second.borrow_mut() = "two"));

        assert!(sink.contains(LogLevel::Error, "already has a pending continuation"));
        sessions.fire(id, Args::new());
        assert_eq!(*which.borrow(), "one");
    }
}
