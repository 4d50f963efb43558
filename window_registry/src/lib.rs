//! # Window Registry
//!
//! This crate implements the live registry of window endpoints.
//!
//! ## Philosophy
//!
//! - Windows come and go with their own lifecycle; the registry only
//!   reflects membership, it does not manage processes
//! - Delivery is a single non-blocking capability per window
//! - Broadcast callers operate on a [`WindowRegistry::snapshot`] taken at
//!   call start, never on the live structure
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A window manager (no Z-order, no geometry)
//! - A process supervisor (no spawning, no exit handling)

use core_types::WindowId;
use ipc::Envelope;
use std::rc::Rc;
use thiserror::Error;

/// Registry error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Window already registered: {0}")]
    AlreadyRegistered(WindowId),

    #[error("Window not found: {0}")]
    NotFound(WindowId),
}

/// Error raised by an endpoint that could not accept an envelope
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Delivery failed: {reason}")]
pub struct DeliveryError {
    /// Transport-reported reason
    pub reason: String,
}

impl DeliveryError {
    /// Creates a delivery error with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Delivery capability of a window-hosted process
///
/// `deliver` must not block the caller; the transport queues the envelope
/// and returns. A returned error means the envelope was not accepted, not
/// that processing failed remotely.
pub trait WindowEndpoint {
    /// Hands an envelope to the window's transport
    fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError>;
}

/// A window identity paired with its delivery capability
///
/// Handles are cheap to clone; routing code clones them out of a snapshot
/// and never holds them across registry mutations.
#[derive(Clone)]
pub struct WindowHandle {
    id: WindowId,
    endpoint: Rc<dyn WindowEndpoint>,
}

impl WindowHandle {
    /// Creates a handle from an identity and endpoint
    pub fn new(id: WindowId, endpoint: Rc<dyn WindowEndpoint>) -> Self {
        Self { id, endpoint }
    }

    /// Returns the window identity
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Delivers an envelope through the window's endpoint
    pub fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError> {
        self.endpoint.deliver(envelope)
    }
}

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle").field("id", &self.id).finish()
    }
}

/// Live registry of window endpoints
///
/// Maintains membership in registration order plus a distinguished main
/// window slot that may be absent (during startup and shutdown). Owned by
/// the composition root; the routing core holds only a shared handle and
/// never mutates membership.
#[derive(Default)]
pub struct WindowRegistry {
    /// Registered windows, in registration order
    windows: Vec<WindowHandle>,
    /// Distinguished main window, if any
    main: Option<WindowId>,
}

impl WindowRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a window endpoint
    pub fn register(
        &mut self,
        id: WindowId,
        endpoint: Rc<dyn WindowEndpoint>,
    ) -> Result<(), RegistryError> {
        if self.windows.iter().any(|handle| handle.id == id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.windows.push(WindowHandle::new(id, endpoint));
        Ok(())
    }

    /// Unregisters a window
    ///
    /// Clears the main slot if the departing window held it.
    pub fn unregister(&mut self, id: WindowId) -> Result<(), RegistryError> {
        let pos = self
            .windows
            .iter()
            .position(|handle| handle.id == id)
            .ok_or(RegistryError::NotFound(id))?;
        self.windows.remove(pos);
        if self.main == Some(id) {
            self.main = None;
        }
        Ok(())
    }

    /// Marks a registered window as the main window
    pub fn set_main(&mut self, id: WindowId) -> Result<(), RegistryError> {
        if !self.windows.iter().any(|handle| handle.id == id) {
            return Err(RegistryError::NotFound(id));
        }
        self.main = Some(id);
        Ok(())
    }

    /// Clears the main window slot
    pub fn clear_main(&mut self) {
        self.main = None;
    }

    /// Returns the main window handle, if one is registered
    pub fn main_window(&self) -> Option<WindowHandle> {
        let id = self.main?;
        self.get(id)
    }

    /// Returns the handle for a window, if registered
    pub fn get(&self, id: WindowId) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|handle| handle.id == id)
            .cloned()
    }

    /// Returns a point-in-time copy of the membership, in registration order
    ///
    /// Broadcasts iterate the snapshot, so membership changes made while
    /// deliveries run neither skip nor duplicate a destination.
    pub fn snapshot(&self) -> Vec<WindowHandle> {
        self.windows.clone()
    }

    /// Returns the number of registered windows
    pub fn count(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipc::Args;
    use std::cell::RefCell;

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

    #[test]
    fn test_registration_and_lookup() {
        let mut registry = WindowRegistry::new();
        let id = WindowId::new();

        registry
            .register(id, Rc::new(RecordingEndpoint::default()))
            .unwrap();
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get(id).unwrap().id(), id);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = WindowRegistry::new();
        let id = WindowId::new();

        registry
            .register(id, Rc::new(RecordingEndpoint::default()))
            .unwrap();
        let result = registry.register(id, Rc::new(RecordingEndpoint::default()));
        assert_eq!(result, Err(RegistryError::AlreadyRegistered(id)));
    }

    #[test]
    fn test_unregister_clears_main() {
        let mut registry = WindowRegistry::new();
        let id = WindowId::new();

        registry
            .register(id, Rc::new(RecordingEndpoint::default()))
            .unwrap();
        registry.set_main(id).unwrap();
        assert!(registry.main_window().is_some());

        registry.unregister(id).unwrap();
        assert!(registry.main_window().is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_set_main_requires_registration() {
        let mut registry = WindowRegistry::new();
        let id = WindowId::new();
        assert_eq!(registry.set_main(id), Err(RegistryError::NotFound(id)));
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let mut registry = WindowRegistry::new();
        let first = WindowId::new();
        let second = WindowId::new();

        registry
            .register(first, Rc::new(RecordingEndpoint::default()))
            .unwrap();
        registry
            .register(second, Rc::new(RecordingEndpoint::default()))
            .unwrap();

        let ids: Vec<WindowId> = registry.snapshot().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_snapshot_isolated_from_later_mutation() {
        let mut registry = WindowRegistry::new();
        let stays = WindowId::new();
        let leaves = WindowId::new();

        registry
            .register(stays, Rc::new(RecordingEndpoint::default()))
            .unwrap();
        registry
            .register(leaves, Rc::new(RecordingEndpoint::default()))
            .unwrap();

        let snapshot = registry.snapshot();
        registry.unregister(leaves).unwrap();

        assert_eq!(snapshot.len(), 2);
        for handle in &snapshot {
            handle
                .deliver(Envelope::new("still.reachable", Args::new()))
                .unwrap();
        }
    }

    #[test]
    fn test_handle_delivers_through_endpoint() {
        let mut registry = WindowRegistry::new();
        let id = WindowId::new();
        let endpoint = Rc::new(RecordingEndpoint::default());

        registry.register(id, endpoint.clone()).unwrap();
        registry
            .get(id)
            .unwrap()
            .deliver(Envelope::new("status.changed", Args::new().with_value("idle")))
            .unwrap();

        let delivered = endpoint.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].message, "status.changed");
    }
}
