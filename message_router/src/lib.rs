//! # Message Router
//!
//! This crate implements Atrium's routing and correlation core: the
//! messaging fabric between the coordinating process, its window-hosted
//! processes, and the panels inside them.
//!
//! ## Philosophy
//!
//! - **Explicit registries**: window and panel registries are owned by the
//!   composition root and passed in as handles; nothing here is ambient
//! - **Fire-and-forget by default**: sends and broadcasts return without
//!   waiting for delivery; only requests correlate a reply, and even those
//!   never block
//! - **Best-effort delivery**: destinations come and go with window
//!   lifecycle; an unreachable destination is a logged warning, never a
//!   fault
//! - **At-most-once replies**: a session's continuation can fire once,
//!   ever, no matter how many reply envelopes arrive
//!
//! ## Architecture
//!
//! [`MessageFabric`] composes the pieces: the [`dispatcher`] handles
//! messages addressed to the coordinating process itself, the [`router`]
//! resolves logical destinations against the registries, and the
//! [`session`] manager pairs outgoing requests with their replies through
//! the single-fire handles in [`request`].

pub mod dispatcher;
pub mod request;
pub mod router;
pub mod session;

pub use dispatcher::{Dispatcher, Handler, HandlerError, LocalSender, MessageContext, MessageSource};
pub use request::{ReplyHandle, ReplyRoute, RequestError};
pub use router::{DeliveryPlan, Destination, Router};
pub use session::{Continuation, SessionManager, FIRST_SESSION_ID};

use core_types::{PanelId, SessionId, WindowId};
use diagnostics::{DiagnosticSink, LogEntry};
use ipc::{Args, DeliveryOptions, Envelope, ReplyEnvelope, RequestEnvelope};
use panel_registry::PanelRegistry;
use std::cell::RefCell;
use std::rc::Rc;
use window_registry::WindowRegistry;

/// The messaging fabric of one coordinating process
///
/// Owns the dispatcher and session manager; borrows the window and panel
/// registries from the composition root. All operations return without
/// waiting for remote delivery. Inbound traffic from window transports
/// enters through [`MessageFabric::handle_request`] and
/// [`MessageFabric::handle_reply`].
pub struct MessageFabric {
    dispatcher: Dispatcher,
    sessions: Rc<SessionManager>,
    router: Router,
    windows: Rc<RefCell<WindowRegistry>>,
    sink: Rc<dyn DiagnosticSink>,
}

impl MessageFabric {
    /// Creates a fabric over the given registries and diagnostic sink
    pub fn new(
        windows: Rc<RefCell<WindowRegistry>>,
        panels: Rc<RefCell<PanelRegistry>>,
        sink: Rc<dyn DiagnosticSink>,
    ) -> Self {
        let dispatcher = Dispatcher::new(sink.clone());
        let sessions = Rc::new(SessionManager::new(sink.clone()));
        let router = Router::new(
            windows.clone(),
            panels,
            dispatcher.clone(),
            sink.clone(),
        );
        Self {
            dispatcher,
            sessions,
            router,
            windows,
            sink,
        }
    }

    /// Registers a handler for messages addressed to the coordinating
    /// process
    pub fn register_handler(
        &self,
        message: &str,
        handler: impl Fn(&MessageContext, &Args) -> Result<(), HandlerError> + 'static,
    ) {
        self.dispatcher.register(message, handler);
    }

    /// Broadcasts a message to every live window
    pub fn broadcast_to_windows(&self, message: &str, args: Args) {
        self.router.deliver(
            &Destination::AllWindows,
            Envelope::new(message, args),
            DeliveryOptions::new(),
            None,
        );
    }

    /// Broadcasts a message to the coordinating process's own handlers and
    /// to every live window
    ///
    /// With `exclude_self` set, the sender is removed from whichever side
    /// of the destination set it occupies: a window sender is filtered
    /// from the window set, a coordinator sender (`sender == None`) skips
    /// local dispatch.
    pub fn broadcast_all(
        &self,
        message: &str,
        args: Args,
        options: DeliveryOptions,
        sender: Option<WindowId>,
    ) {
        let include_local = !(options.exclude_self && sender.is_none());
        if include_local {
            self.router.deliver(
                &Destination::Coordinator,
                Envelope::new(message, args.clone()),
                DeliveryOptions::new(),
                None,
            );
        }
        self.router.deliver(
            &Destination::AllWindows,
            Envelope::new(message, args),
            options,
            sender,
        );
    }

    /// Sends a message to the main window
    ///
    /// If no main window is registered the message is dropped with a
    /// logged warning; absence is an expected transient state during
    /// startup and shutdown.
    pub fn send_to_main_window(&self, message: &str, args: Args) {
        self.router.deliver(
            &Destination::MainWindow,
            Envelope::new(message, args),
            DeliveryOptions::new(),
            None,
        );
    }

    /// Sends a message to a panel
    ///
    /// The envelope shape depends on the panel kind: simple panels receive
    /// the raw message, composite panels a wrapper carrying the panel ID.
    /// An unknown panel is dropped silently; it may simply have closed.
    pub fn send_to_panel(&self, panel_id: PanelId, message: &str, args: Args) {
        self.router.deliver(
            &Destination::Panel(panel_id),
            Envelope::new(message, args),
            DeliveryOptions::new(),
            None,
        );
    }

    /// Issues a request from the coordinating process to its own handlers
    ///
    /// Allocates a session, registers the continuation, and dispatches the
    /// request. The session ID is returned even when no handler is
    /// registered; the caller may cancel at any time, and an unanswered
    /// request simply never fires.
    pub fn send_request(
        &self,
        message: &str,
        args: Args,
        continuation: impl FnOnce(Args) + 'static,
    ) -> Result<SessionId, RequestError> {
        if message.trim().is_empty() {
            self.sink.record(LogEntry::error(
                "request",
                "Rejected request with an empty message name",
            ));
            return Err(RequestError::EmptyMessage);
        }
        let session_id = self.sessions.allocate();
        self.sessions
            .register(session_id, message, Box::new(continuation));
        self.dispatch_request(
            MessageSource::Coordinator,
            RequestEnvelope::new(session_id, message, args),
            ReplyRoute::Local(self.sessions.clone()),
        );
        Ok(session_id)
    }

    /// Cancels an outstanding request
    ///
    /// Only prevents the continuation from firing; an in-flight request
    /// already dispatched to a handler is not retracted, and a late reply
    /// becomes a harmless no-op.
    pub fn cancel_request(&self, session_id: SessionId) {
        self.sessions.cancel(session_id);
    }

    /// Intake for request envelopes arriving from a window transport
    pub fn handle_request(&self, origin: WindowId, envelope: &Envelope) {
        let request = match RequestEnvelope::from_envelope(envelope) {
            Ok(request) => request,
            Err(err) => {
                self.sink.record(
                    LogEntry::error("request", format!("Malformed request envelope: {}", err))
                        .with_window(origin),
                );
                return;
            }
        };
        let handle = self.windows.borrow().get(origin);
        let Some(handle) = handle else {
            self.sink.record(
                LogEntry::warn(
                    "request",
                    format!("Request origin not registered; dropping {}", request.session_id),
                )
                .with_window(origin)
                .with_field("message_name", request.message),
            );
            return;
        };
        self.dispatch_request(
            MessageSource::Window(origin),
            request,
            ReplyRoute::Window(handle),
        );
    }

    /// Intake for reply envelopes arriving from a window transport
    ///
    /// Unknown session IDs are a silent no-op: the session already fired,
    /// was cancelled, or never existed here.
    pub fn handle_reply(&self, envelope: &Envelope) {
        match ReplyEnvelope::from_envelope(envelope) {
            Ok(reply) => {
                self.sessions.fire(reply.session_id, reply.args);
            }
            Err(err) => {
                self.sink.record(LogEntry::error(
                    "request",
                    format!("Malformed reply envelope: {}", err),
                ));
            }
        }
    }

    fn dispatch_request(
        &self,
        source: MessageSource,
        request: RequestEnvelope,
        route: ReplyRoute,
    ) {
        let reply = ReplyHandle::new(request.session_id, route, self.sink.clone());
        let ctx = MessageContext::with_reply(source, reply, self.dispatcher.clone());
        if !self.dispatcher.emit(&request.message, &ctx, &request.args) {
            self.sink.record(
                LogEntry::error(
                    "request",
                    format!("Listener not registered for '{}'", request.message),
                )
                .with_field("session_id", request.session_id.to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::{LogLevel, MemorySink};
    use std::cell::Cell;
    use window_registry::{DeliveryError, WindowEndpoint};

    #[derive(Default)]
    struct RecordingEndpoint {
        delivered: RefCell<Vec<Envelope>>,
    }

    impl WindowEndpoint for RecordingEndpoint {
        fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError> {
            self.delivered.borrow_mut().push(envelope);
            Ok(())
        }
    }

    struct Fixture {
        windows: Rc<RefCell<WindowRegistry>>,
        sink: Rc<MemorySink>,
        fabric: MessageFabric,
    }

    impl Fixture {
        fn new() -> Self {
            let windows = Rc::new(RefCell::new(WindowRegistry::new()));
            let panels = Rc::new(RefCell::new(PanelRegistry::new()));
            let sink = Rc::new(MemorySink::new());
            let fabric = MessageFabric::new(windows.clone(), panels, sink.clone());
            Self {
                windows,
                sink,
                fabric,
            }
        }

        fn add_window(&self) -> (WindowId, Rc<RecordingEndpoint>) {
            let id = WindowId::new();
            let endpoint = Rc::new(RecordingEndpoint::default());
            self.windows
                .borrow_mut()
                .register(id, endpoint.clone())
                .unwrap();
            (id, endpoint)
        }
    }

    #[test]
    fn test_first_session_id_is_1000() {
        let fixture = Fixture::new();
        let id = fixture
            .fabric
            .send_request("version.get", Args::new(), |_args| {})
            .unwrap();
        assert_eq!(id, SessionId::from_raw(1000));
    }

    #[test]
    fn test_empty_message_name_is_rejected() {
        let fixture = Fixture::new();
        let result = fixture.fabric.send_request("  ", Args::new(), |_args| {});
        assert_eq!(result, Err(RequestError::EmptyMessage));
        assert!(fixture.sink.contains(LogLevel::Error, "empty message name"));
    }

    #[test]
    fn test_local_request_round_trip() {
        let fixture = Fixture::new();
        fixture.fabric.register_handler("version.get", |ctx, _args| {
            ctx.reply()
                .expect("request dispatch carries a reply handle")
                .send(Args::new().with_value("1.2.3"));
            Ok(())
        });

        let received = Rc::new(RefCell::new(None));
        let slot = received.clone();
        fixture
            .fabric
            .send_request("version.get", Args::new(), move |args| {
                *slot.borrow_mut() = Some(args);
            })
            .unwrap();

        let args = received.borrow_mut().take().unwrap();
        assert_eq!(args.get(0), Some(&serde_json::json!("1.2.3")));
    }

    #[test]
    fn test_duplicate_reply_envelope_is_noop() {
        let fixture = Fixture::new();
        let fired = Rc::new(Cell::new(0));

        let count = fired.clone();
        let id = fixture
            .fabric
            .send_request("version.get", Args::new(), move |_args| {
                count.set(count.get() + 1);
            })
            .unwrap();

        let reply = ReplyEnvelope::new(id, Args::new().with_value("1.2.3"))
            .into_envelope()
            .unwrap();
        fixture.fabric.handle_reply(&reply);
        fixture.fabric.handle_reply(&reply);

        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_cancel_before_late_reply() {
        let fixture = Fixture::new();
        let fired = Rc::new(Cell::new(false));

        let flag = fired.clone();
        let id = fixture
            .fabric
            .send_request("slow.op", Args::new(), move |_args| flag.set(true))
            .unwrap();
        fixture.fabric.cancel_request(id);

        let reply = ReplyEnvelope::new(id, Args::new()).into_envelope().unwrap();
        fixture.fabric.handle_reply(&reply);

        assert!(!fired.get());
    }

    #[test]
    fn test_window_request_replies_through_origin_endpoint() {
        let fixture = Fixture::new();
        let (origin, endpoint) = fixture.add_window();

        fixture.fabric.register_handler("version.get", |ctx, _args| {
            assert!(matches!(ctx.source(), MessageSource::Window(_)));
            ctx.reply()
                .expect("request dispatch carries a reply handle")
                .send(Args::new().with_value("1.2.3"));
            Ok(())
        });

        let request = RequestEnvelope::new(SessionId::from_raw(4242), "version.get", Args::new())
            .into_envelope()
            .unwrap();
        fixture.fabric.handle_request(origin, &request);

        let delivered = endpoint.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        let reply = ReplyEnvelope::from_envelope(&delivered[0]).unwrap();
        assert_eq!(reply.session_id, SessionId::from_raw(4242));
        assert_eq!(reply.args.get(0), Some(&serde_json::json!("1.2.3")));
    }

    #[test]
    fn test_unregistered_listener_is_reported() {
        let fixture = Fixture::new();
        let (origin, endpoint) = fixture.add_window();

        let request = RequestEnvelope::new(SessionId::from_raw(1000), "nobody.home", Args::new())
            .into_envelope()
            .unwrap();
        fixture.fabric.handle_request(origin, &request);

        assert!(endpoint.delivered.borrow().is_empty());
        assert!(fixture
            .sink
            .contains(LogLevel::Error, "Listener not registered for 'nobody.home'"));
    }

    #[test]
    fn test_malformed_request_envelope_is_reported() {
        let fixture = Fixture::new();
        let (origin, _endpoint) = fixture.add_window();

        fixture
            .fabric
            .handle_request(origin, &Envelope::new("not.a.request", Args::new()));

        assert!(fixture
            .sink
            .contains(LogLevel::Error, "Malformed request envelope"));
    }

    #[test]
    fn test_request_from_departed_window_is_dropped() {
        let fixture = Fixture::new();
        let departed = WindowId::new();

        fixture.fabric.register_handler("version.get", |_ctx, _args| Ok(()));
        let request = RequestEnvelope::new(SessionId::from_raw(1000), "version.get", Args::new())
            .into_envelope()
            .unwrap();
        fixture.fabric.handle_request(departed, &request);

        assert!(fixture
            .sink
            .contains(LogLevel::Warn, "Request origin not registered"));
    }

    #[test]
    fn test_broadcast_all_excludes_the_sending_window() {
        let fixture = Fixture::new();
        let (id_a, a) = fixture.add_window();
        let (_id_b, b) = fixture.add_window();

        let locally_seen = Rc::new(Cell::new(false));
        let seen = locally_seen.clone();
        fixture.fabric.register_handler("ping", move |_ctx, args| {
            assert_eq!(args.get(0), Some(&serde_json::json!("x")));
            seen.set(true);
            Ok(())
        });

        fixture.fabric.broadcast_all(
            "ping",
            Args::new().with_value("x"),
            DeliveryOptions::excluding_self(),
            Some(id_a),
        );

        assert!(locally_seen.get());
        assert!(a.delivered.borrow().is_empty());
        assert_eq!(b.delivered.borrow().len(), 1);
        assert_eq!(b.delivered.borrow()[0].message, "ping");
    }

    #[test]
    fn test_broadcast_all_from_coordinator_excluding_self_skips_local() {
        let fixture = Fixture::new();
        let (_id, endpoint) = fixture.add_window();

        let locally_seen = Rc::new(Cell::new(false));
        let seen = locally_seen.clone();
        fixture.fabric.register_handler("ping", move |_ctx, _args| {
            seen.set(true);
            Ok(())
        });

        fixture.fabric.broadcast_all(
            "ping",
            Args::new(),
            DeliveryOptions::excluding_self(),
            None,
        );

        assert!(!locally_seen.get());
        assert_eq!(endpoint.delivered.borrow().len(), 1);
    }

    #[test]
    fn test_broadcast_to_windows_reaches_every_window() {
        let fixture = Fixture::new();
        let (_id_a, a) = fixture.add_window();
        let (_id_b, b) = fixture.add_window();

        fixture
            .fabric
            .broadcast_to_windows("theme.changed", Args::new().with_value("dark"));

        assert_eq!(a.delivered.borrow().len(), 1);
        assert_eq!(b.delivered.borrow().len(), 1);
    }

    #[test]
    fn test_handler_replying_twice_is_discarded() {
        let fixture = Fixture::new();
        let (origin, endpoint) = fixture.add_window();

        fixture.fabric.register_handler("version.get", |ctx, _args| {
            let reply = ctx.reply().expect("request dispatch carries a reply handle");
            reply.send(Args::new().with_value("first"));
            reply.send(Args::new().with_value("second"));
            Ok(())
        });

        let request = RequestEnvelope::new(SessionId::from_raw(1000), "version.get", Args::new())
            .into_envelope()
            .unwrap();
        fixture.fabric.handle_request(origin, &request);

        assert_eq!(endpoint.delivered.borrow().len(), 1);
        assert!(fixture
            .sink
            .contains(LogLevel::Error, "invoked more than once"));
    }
}
