//! Local publish/subscribe dispatch for the coordinating process.
//!
//! The dispatcher handles messages whose destination is the coordinating
//! process itself. Dispatch is synchronous and reentrant: handlers run in
//! registration order within the caller's own call stack, and a handler may
//! register handlers or emit further messages before returning.

use crate::request::ReplyHandle;
use core_types::WindowId;
use diagnostics::{DiagnosticSink, LogEntry};
use ipc::Args;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Error returned by a failing message handler
///
/// Handler failures are reported to the diagnostic sink at the dispatch
/// boundary; they never propagate to the emitter and never prevent the
/// remaining handlers from running.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Creates a handler error with the given description
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }
}

/// A registered message handler
pub type Handler = Rc<dyn Fn(&MessageContext, &Args) -> Result<(), HandlerError>>;

/// Where a dispatched message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// The coordinating process itself
    Coordinator,
    /// A window-hosted process
    Window(WindowId),
}

/// Loopback sender injected into handler contexts
///
/// Lets a handler in the coordinating process broadcast further messages
/// to the coordinating process without distinguishing "I am both sender
/// and destination".
#[derive(Clone)]
pub struct LocalSender {
    dispatcher: Dispatcher,
}

impl LocalSender {
    /// Sends a message back into coordinator-local dispatch
    pub fn send(&self, message: &str, args: Args) {
        self.dispatcher.emit_local(message, &args);
    }
}

/// Context handed to every handler invocation
pub struct MessageContext {
    source: MessageSource,
    reply: Option<ReplyHandle>,
    sender: LocalSender,
}

impl MessageContext {
    pub(crate) fn local(dispatcher: Dispatcher) -> Self {
        Self {
            source: MessageSource::Coordinator,
            reply: None,
            sender: LocalSender { dispatcher },
        }
    }

    pub(crate) fn with_reply(
        source: MessageSource,
        reply: ReplyHandle,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            source,
            reply: Some(reply),
            sender: LocalSender { dispatcher },
        }
    }

    /// Returns where the message came from
    pub fn source(&self) -> MessageSource {
        self.source
    }

    /// Returns the reply capability, present only for request dispatches
    pub fn reply(&self) -> Option<&ReplyHandle> {
        self.reply.as_ref()
    }

    /// Returns the loopback sender
    pub fn sender(&self) -> &LocalSender {
        &self.sender
    }
}

/// Registry mapping message names to ordered handler lists
///
/// Cheap to clone; clones share the same handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Rc<RefCell<HashMap<String, Vec<Handler>>>>,
    sink: Rc<dyn DiagnosticSink>,
}

impl Dispatcher {
    /// Creates an empty dispatcher reporting to `sink`
    pub fn new(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            handlers: Rc::new(RefCell::new(HashMap::new())),
            sink,
        }
    }

    /// Registers a handler for a message name
    ///
    /// Handlers for the same name run in registration order.
    pub fn register(
        &self,
        message: &str,
        handler: impl Fn(&MessageContext, &Args) -> Result<(), HandlerError> + 'static,
    ) {
        self.handlers
            .borrow_mut()
            .entry(message.to_string())
            .or_default()
            .push(Rc::new(handler));
    }

    /// Invokes every handler registered for `message`, in order
    ///
    /// Returns whether at least one handler was registered. A failing
    /// handler is reported to the sink and does not stop the rest. The
    /// handler list is copied out before the first invocation, so
    /// registrations made by a handler take effect from the next emit.
    pub fn emit(&self, message: &str, ctx: &MessageContext, args: &Args) -> bool {
        let handlers: Vec<Handler> = match self.handlers.borrow().get(message) {
            Some(list) => list.clone(),
            None => return false,
        };
        if handlers.is_empty() {
            return false;
        }
        for handler in &handlers {
            if let Err(err) = handler(ctx, args) {
                self.sink.record(LogEntry::error(
                    "dispatcher",
                    format!("Handler failed for '{}': {}", message, err),
                ));
            }
        }
        true
    }

    /// Emits with a synthetic coordinator-local context
    ///
    /// This is the delivery path for messages addressed to the
    /// coordinating process. An unhandled message is reported as a
    /// warning rather than dropped silently.
    pub(crate) fn emit_local(&self, message: &str, args: &Args) -> bool {
        let ctx = MessageContext::local(self.clone());
        let handled = self.emit(message, &ctx, args);
        if !handled {
            self.sink.record(LogEntry::warn(
                "dispatcher",
                format!("No listener registered for '{}'", message),
            ));
        }
        handled
    }
}
