//! Destination resolution and delivery execution.
//!
//! The router turns a logical destination into a concrete delivery plan
//! against a point-in-time snapshot of the window registry, then executes
//! the plan. Local and remote delivery stay behind separate interfaces:
//! the dispatcher for the coordinating process, window endpoints for
//! everything else.

use crate::dispatcher::Dispatcher;
use core_types::{PanelId, WindowId};
use diagnostics::{DiagnosticSink, LogEntry};
use ipc::{DeliveryOptions, Envelope, PanelEnvelope};
use panel_registry::{PanelKind, PanelRegistry};
use std::cell::RefCell;
use std::rc::Rc;
use window_registry::{WindowHandle, WindowRegistry};

/// Logical destination of a send or broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Every live window
    AllWindows,
    /// The distinguished main window
    MainWindow,
    /// The coordinating process itself
    Coordinator,
    /// A panel hosted inside a window
    Panel(PanelId),
}

/// Concrete delivery plan for one resolved destination
#[derive(Clone)]
pub enum DeliveryPlan {
    /// Deliver the envelope unchanged to each window, in snapshot order
    Windows(Vec<WindowHandle>),
    /// Emit on the coordinating process's local dispatcher
    Local,
    /// Wrap in a panel envelope, then deliver to the owning window
    Composite {
        target: WindowHandle,
        panel_id: PanelId,
    },
    /// No live destination; the reason has been reported
    Dropped,
}

/// Resolves logical destinations against the registries
///
/// Holds shared handles to the registries owned by the composition root;
/// it only ever reads them.
pub struct Router {
    windows: Rc<RefCell<WindowRegistry>>,
    panels: Rc<RefCell<PanelRegistry>>,
    dispatcher: Dispatcher,
    sink: Rc<dyn DiagnosticSink>,
}

impl Router {
    /// Creates a router over the given registries
    pub fn new(
        windows: Rc<RefCell<WindowRegistry>>,
        panels: Rc<RefCell<PanelRegistry>>,
        dispatcher: Dispatcher,
        sink: Rc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            windows,
            panels,
            dispatcher,
            sink,
        }
    }

    /// Resolves a destination into a delivery plan
    ///
    /// Broadcast plans are built from a snapshot taken here, at call time;
    /// membership changes made while the plan executes neither skip nor
    /// duplicate a destination. With `exclude_self` set, the sender is
    /// filtered from the set; a sender outside the set is unaffected.
    pub fn resolve(
        &self,
        destination: &Destination,
        options: DeliveryOptions,
        sender: Option<WindowId>,
    ) -> DeliveryPlan {
        match destination {
            Destination::AllWindows => {
                let mut handles = self.windows.borrow().snapshot();
                if options.exclude_self {
                    if let Some(sender) = sender {
                        handles.retain(|handle| handle.id() != sender);
                    }
                }
                DeliveryPlan::Windows(handles)
            }
            Destination::MainWindow => {
                let main = self.windows.borrow().main_window();
                match main {
                    Some(handle) => DeliveryPlan::Windows(vec![handle]),
                    None => {
                        self.sink.record(LogEntry::warn(
                            "router",
                            "No main window registered; dropping message",
                        ));
                        DeliveryPlan::Dropped
                    }
                }
            }
            Destination::Coordinator => DeliveryPlan::Local,
            Destination::Panel(panel_id) => {
                let descriptor = self.panels.borrow().lookup(panel_id);
                let Some(descriptor) = descriptor else {
                    // The panel may have closed between addressing and routing.
                    self.sink.record(
                        LogEntry::debug("router", "Panel not registered; dropping message")
                            .with_field("panel_id", panel_id.as_str()),
                    );
                    return DeliveryPlan::Dropped;
                };
                let owner = self.windows.borrow().get(descriptor.owner);
                match owner {
                    Some(target) => match descriptor.kind {
                        PanelKind::Simple => DeliveryPlan::Windows(vec![target]),
                        PanelKind::Composite => DeliveryPlan::Composite {
                            target,
                            panel_id: panel_id.clone(),
                        },
                    },
                    None => {
                        self.sink.record(
                            LogEntry::warn("router", "Panel owner window not registered")
                                .with_window(descriptor.owner)
                                .with_field("panel_id", panel_id.as_str()),
                        );
                        DeliveryPlan::Dropped
                    }
                }
            }
        }
    }

    /// Resolves a destination and executes the resulting plan
    ///
    /// Window deliveries are independent: a failing endpoint is logged and
    /// the remaining deliveries proceed.
    pub fn deliver(
        &self,
        destination: &Destination,
        envelope: Envelope,
        options: DeliveryOptions,
        sender: Option<WindowId>,
    ) {
        match self.resolve(destination, options, sender) {
            DeliveryPlan::Windows(handles) => {
                for handle in handles {
                    if let Err(err) = handle.deliver(envelope.clone()) {
                        self.sink.record(
                            LogEntry::warn(
                                "router",
                                format!("Delivery of '{}' failed: {}", envelope.message, err),
                            )
                            .with_window(handle.id()),
                        );
                    }
                }
            }
            DeliveryPlan::Local => {
                self.dispatcher.emit_local(&envelope.message, &envelope.args);
            }
            DeliveryPlan::Composite { target, panel_id } => {
                let wrapped = PanelEnvelope::new(panel_id, envelope.message, envelope.args)
                    .into_envelope();
                match wrapped {
                    Ok(wrapped) => {
                        if let Err(err) = target.deliver(wrapped) {
                            self.sink.record(
                                LogEntry::warn(
                                    "router",
                                    format!("Panel envelope delivery failed: {}", err),
                                )
                                .with_window(target.id()),
                            );
                        }
                    }
                    Err(err) => {
                        self.sink.record(LogEntry::error(
                            "router",
                            format!("Could not encode panel envelope: {}", err),
                        ));
                    }
                }
            }
            DeliveryPlan::Dropped => {}
        }
    }
}
