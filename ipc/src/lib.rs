//! # Inter-Process Communication (IPC)
//!
//! This crate defines Atrium's message-passing wire model.
//!
//! ## Philosophy
//!
//! - **Messages, not shared memory**: All communication between the
//!   coordinating process and window processes is explicit message passing
//! - **Typed, not stringly-typed**: Request, reply, and panel traffic
//!   travel as typed envelopes with schema versions
//! - **Correlated**: Requests carry a session ID so a reply can be matched
//!   to exactly one outstanding request
//! - **Versionable**: Schema evolution is built-in from day one
//!
//! ## Architecture
//!
//! [`Envelope`] is the unit delivered to an endpoint: a message name, a
//! schema version, and an ordered sequence of argument values. Request,
//! reply, and composite-panel traffic are typed payloads carried on
//! reserved channels ([`REQUEST_CHANNEL`], [`REPLY_CHANNEL`],
//! [`PANEL_ENVELOPE_CHANNEL`]) so the receiving side can demultiplex
//! before decoding.

pub mod envelope;
pub mod options;
pub mod typed;

pub use envelope::{
    Args, Envelope, SchemaVersion, FABRIC_SCHEMA_VERSION, PANEL_ENVELOPE_CHANNEL, REPLY_CHANNEL,
    REQUEST_CHANNEL,
};
pub use options::DeliveryOptions;
pub use typed::{EnvelopeError, PanelEnvelope, ReplyEnvelope, RequestEnvelope};
