//! Unique identifiers for fabric entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a window-hosted process
///
/// Windows are addressable endpoints that can receive messages. The
/// identifier is used only for equality and exclusion; it carries no
/// delivery capability by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(Uuid);

impl WindowId {
    /// Creates a new random window ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a window ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window({})", self.0)
    }
}

/// Identifier for a panel hosted inside a window
///
/// Panel identifiers are dotted names (`"package.panel"` by convention),
/// assigned by the package that declares the panel. They are resolved to an
/// owning window through the panel registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(String);

impl PanelId {
    /// Creates a panel ID from a dotted name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the panel name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PanelId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Panel({})", self.0)
    }
}

/// Identifier for one outstanding request/reply session
///
/// Session IDs are allocated from a strictly increasing counter and are
/// never reused for the lifetime of the process. They are process-local
/// and not meaningful across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session ID from a raw counter value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_id_creation() {
        let id1 = WindowId::new();
        let id2 = WindowId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_window_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = WindowId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_window_id_display() {
        let id = WindowId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("Window("));
    }

    #[test]
    fn test_panel_id_name() {
        let id = PanelId::new("files.tree");
        assert_eq!(id.as_str(), "files.tree");
        assert_eq!(format!("{}", id), "Panel(files.tree)");
    }

    #[test]
    fn test_panel_id_equality() {
        let id1 = PanelId::new("files.tree");
        let id2 = PanelId::from("files.tree");
        let id3 = PanelId::new("files.search");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_session_id_ordering() {
        let id1 = SessionId::from_raw(1000);
        let id2 = SessionId::from_raw(1001);
        assert!(id1 < id2);
        assert_eq!(id1.as_raw(), 1000);
    }

    #[test]
    fn test_session_id_serde_roundtrip() {
        let id = SessionId::from_raw(1234);
        let json = serde_json::to_string(&id).unwrap();
        let decoded: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, id);
    }
}
