//! # Panel Registry
//!
//! This crate implements the panel metadata registry: which window owns a
//! panel, and how messages addressed to it must be shaped.
//!
//! ## Philosophy
//!
//! - Panels are declared by packages and registered when their owning
//!   window opens them; the fabric only reads this registry
//! - Lookup is fallible by design: a panel may close between the caller
//!   deciding to address it and the message being routed

use core_types::{PanelId, WindowId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Registry error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelRegistryError {
    #[error("Panel already registered: {0}")]
    AlreadyRegistered(PanelId),

    #[error("Panel not found: {0}")]
    NotFound(PanelId),
}

/// How messages addressed to a panel are shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelKind {
    /// The panel receives the raw message directly
    Simple,
    /// The panel hosts nested routing; messages are wrapped in a panel
    /// envelope so the owning window can demultiplex locally
    Composite,
}

/// Metadata for a registered panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    /// Window hosting the panel
    pub owner: WindowId,
    /// Delivery shape for the panel
    pub kind: PanelKind,
}

impl PanelDescriptor {
    /// Creates a descriptor
    pub fn new(owner: WindowId, kind: PanelKind) -> Self {
        Self { owner, kind }
    }
}

/// Registry of live panels
///
/// Owned by the composition root alongside the window registry. The
/// routing core only calls [`PanelRegistry::lookup`].
#[derive(Debug, Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelId, PanelDescriptor>,
}

impl PanelRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a panel
    pub fn register(
        &mut self,
        panel_id: PanelId,
        descriptor: PanelDescriptor,
    ) -> Result<(), PanelRegistryError> {
        if self.panels.contains_key(&panel_id) {
            return Err(PanelRegistryError::AlreadyRegistered(panel_id));
        }
        self.panels.insert(panel_id, descriptor);
        Ok(())
    }

    /// Unregisters a panel
    pub fn unregister(&mut self, panel_id: &PanelId) -> Result<(), PanelRegistryError> {
        self.panels
            .remove(panel_id)
            .map(|_| ())
            .ok_or_else(|| PanelRegistryError::NotFound(panel_id.clone()))
    }

    /// Removes every panel owned by a window
    ///
    /// Called by the composition root when a window closes.
    pub fn unregister_owned_by(&mut self, owner: WindowId) -> usize {
        let before = self.panels.len();
        self.panels.retain(|_, descriptor| descriptor.owner != owner);
        before - self.panels.len()
    }

    /// Looks up a panel descriptor
    pub fn lookup(&self, panel_id: &PanelId) -> Option<PanelDescriptor> {
        self.panels.get(panel_id).copied()
    }

    /// Returns the number of registered panels
    pub fn count(&self) -> usize {
        self.panels.len()
    }
}
