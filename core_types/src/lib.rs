//! # Core Types
//!
//! This crate defines the fundamental identifier types used throughout
//! Atrium.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Windows, panels, and sessions are addressed
//!   by typed identifiers that cannot be confused with one another.
//! - **Type safety first**: A `SessionId` can never be passed where a
//!   `WindowId` is expected.
//! - **No ambient authority**: Identifiers carry no delivery capability by
//!   themselves; they are only names.
//!
//! ## Key Types
//!
//! - [`WindowId`]: Unique identifier for a window-hosted process
//! - [`PanelId`]: Identifier for a panel hosted inside a window
//! - [`SessionId`]: Identifier for one outstanding request/reply session

pub mod ids;

pub use ids::{PanelId, SessionId, WindowId};
