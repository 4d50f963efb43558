//! Request/reply correlation: the single-fire reply capability.
//!
//! An inbound request is dispatched with a [`ReplyHandle`] bound to its
//! session and originator. The handle enforces at-most-once independently
//! of the session manager: the session manager guards the originator's
//! side, the handle guards the handler's side.

use crate::session::SessionManager;
use core_types::SessionId;
use diagnostics::{DiagnosticSink, LogEntry};
use ipc::{Args, ReplyEnvelope};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;
use window_registry::WindowHandle;

/// Error rejecting a request before a session is allocated
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request message name must be a non-empty string")]
    EmptyMessage,
}

/// Where a request's reply must travel
pub enum ReplyRoute {
    /// The request originated in the coordinating process; the reply
    /// settles its session directly
    Local(Rc<SessionManager>),
    /// The request originated in a window-hosted process; the reply is
    /// delivered through that window's endpoint
    Window(WindowHandle),
}

/// Single-fire reply capability injected into request handlers
///
/// A second invocation for the same request is protocol misuse: it is
/// reported as an error and discarded, never delivered.
pub struct ReplyHandle {
    session_id: SessionId,
    route: ReplyRoute,
    fired: Cell<bool>,
    sink: Rc<dyn DiagnosticSink>,
}

impl ReplyHandle {
    pub(crate) fn new(session_id: SessionId, route: ReplyRoute, sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            session_id,
            route,
            fired: Cell::new(false),
            sink,
        }
    }

    /// Returns the session this handle replies to
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Sends the reply for this request
    ///
    /// Best-effort: a failed delivery to a departed originator is logged
    /// and dropped. The first call wins; later calls are discarded.
    pub fn send(&self, args: Args) {
        if self.fired.replace(true) {
            self.sink.record(LogEntry::error(
                "request",
                format!("Reply for {} invoked more than once; discarding", self.session_id),
            ));
            return;
        }
        match &self.route {
            ReplyRoute::Local(sessions) => {
                sessions.fire(self.session_id, args);
            }
            ReplyRoute::Window(origin) => {
                let envelope = match ReplyEnvelope::new(self.session_id, args).into_envelope() {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        self.sink.record(LogEntry::error(
                            "request",
                            format!("Could not encode reply for {}: {}", self.session_id, err),
                        ));
                        return;
                    }
                };
                if let Err(err) = origin.deliver(envelope) {
                    self.sink.record(
                        LogEntry::warn(
                            "request",
                            format!("Reply delivery for {} failed: {}", self.session_id, err),
                        )
                        .with_window(origin.id()),
                    );
                }
            }
        }
    }
}
