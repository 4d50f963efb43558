//! Envelope structure and argument sequences

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Schema version for envelope payloads
///
/// This enables backward-compatible evolution of message formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u32,
    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl SchemaVersion {
    /// Creates a new schema version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Checks if this version is compatible with another
    ///
    /// Compatibility rules:
    /// - Same major version = compatible
    /// - Different major version = incompatible
    pub fn is_compatible_with(&self, other: &SchemaVersion) -> bool {
        self.major == other.major
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Schema version spoken by this fabric (v1.0).
pub const FABRIC_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 0);

/// Reserved channel for request envelopes bound for the coordinating process.
pub const REQUEST_CHANNEL: &str = "fabric.request";

/// Reserved channel for reply envelopes bound for a request's originator.
pub const REPLY_CHANNEL: &str = "fabric.request.reply";

/// Reserved channel for composite-panel envelopes demultiplexed by the
/// owning window.
pub const PANEL_ENVELOPE_CHANNEL: &str = "fabric.panel.envelope";

/// Ordered sequence of argument values carried by an envelope
///
/// Argument values are type-erased JSON values; services agree on their
/// meaning per message name. The sequence order is part of the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Args(Vec<Value>);

impl Args {
    /// Creates an empty argument sequence
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a value, builder-style
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    /// Appends a value
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Returns the value at `index`, if present
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the values in order
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// The unit delivered to an endpoint for any operation
///
/// An envelope is a message name (opaque string, namespaced by
/// convention), the schema version it was produced under, and an ordered
/// argument sequence. Request, reply, and composite-panel traffic wrap a
/// typed payload as the single argument of a reserved-channel envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message name
    pub message: String,
    /// Schema version of the payload
    pub schema_version: SchemaVersion,
    /// Argument values, in sender order
    pub args: Args,
}

impl Envelope {
    /// Creates an envelope under the current fabric schema version
    pub fn new(message: impl Into<String>, args: Args) -> Self {
        Self {
            message: message.into(),
            schema_version: FABRIC_SCHEMA_VERSION,
            args,
        }
    }

    /// Overrides the schema version (for compatibility testing)
    pub fn with_schema_version(mut self, schema_version: SchemaVersion) -> Self {
        self.schema_version = schema_version;
        self
    }
}
