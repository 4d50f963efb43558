//! # Fabric Contract Tests
//!
//! This crate provides "golden" tests for the messaging fabric's contracts
//! to ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Wire contracts are written as code
//! - **Testability first**: Contract tests fail when channel names,
//!   schema versions, or envelope shapes change
//! - **Behavior is contract too**: The delivery and correlation guarantees
//!   callers rely on are pinned here end to end
//!
//! ## Structure
//!
//! - [`envelope_contract`]: channel identifiers, schema versions, and
//!   envelope field shapes
//! - [`fabric_scenarios`]: end-to-end delivery and correlation guarantees

pub mod envelope_contract;
pub mod fabric_scenarios;

/// Common test fixtures for fabric contract validation
pub mod test_helpers {
    use core_types::WindowId;
    use diagnostics::MemorySink;
    use ipc::Envelope;
    use message_router::MessageFabric;
    use panel_registry::PanelRegistry;
    use std::cell::RefCell;
    use std::rc::Rc;
    use window_registry::{DeliveryError, WindowEndpoint, WindowRegistry};

    /// Endpoint that records every envelope it accepts
    #[derive(Default)]
    pub struct RecordingEndpoint {
        delivered: RefCell<Vec<Envelope>>,
    }

    impl RecordingEndpoint {
        /// Returns a copy of everything delivered so far
        pub fn delivered(&self) -> Vec<Envelope> {
            self.delivered.borrow().clone()
        }
    }

    impl WindowEndpoint for RecordingEndpoint {
        fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError> {
            self.delivered.borrow_mut().push(envelope);
            Ok(())
        }
    }

    /// A wired-up fabric with its registries and recording sink
    pub struct FabricFixture {
        pub windows: Rc<RefCell<WindowRegistry>>,
        pub panels: Rc<RefCell<PanelRegistry>>,
        pub sink: Rc<MemorySink>,
        pub fabric: MessageFabric,
    }

    impl FabricFixture {
        /// Creates a fabric over empty registries
        pub fn new() -> Self {
            let windows = Rc::new(RefCell::new(WindowRegistry::new()));
            let panels = Rc::new(RefCell::new(PanelRegistry::new()));
            let sink = Rc::new(MemorySink::new());
            let fabric = MessageFabric::new(windows.clone(), panels.clone(), sink.clone());
            Self {
                windows,
                panels,
                sink,
                fabric,
            }
        }

        /// Registers a fresh window with a recording endpoint
        pub fn add_window(&self) -> (WindowId, Rc<RecordingEndpoint>) {
            let id = WindowId::new();
            let endpoint = Rc::new(RecordingEndpoint::default());
            self.windows
                .borrow_mut()
                .register(id, endpoint.clone())
                .unwrap();
            (id, endpoint)
        }
    }

    impl Default for FabricFixture {
        fn default() -> Self {
            Self::new()
        }
    }
}
