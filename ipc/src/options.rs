//! Delivery modifiers passed alongside, not inside, the argument list.

use serde::{Deserialize, Serialize};

/// Modifiers applied to a broadcast delivery
///
/// Options travel as their own typed parameter rather than as a sentinel
/// value at the end of the argument sequence, so an ordinary trailing
/// argument can never be mistaken for an option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOptions {
    /// Remove the sending endpoint from the destination set
    pub exclude_self: bool,
}

impl DeliveryOptions {
    /// Creates options with no modifiers set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that exclude the sender from the destination set
    pub fn excluding_self() -> Self {
        Self { exclude_self: true }
    }
}
