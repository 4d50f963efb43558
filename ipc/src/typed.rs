//! Typed envelopes for the reserved request, reply, and panel channels.
//!
//! Each typed payload travels as the single argument of an [`Envelope`] on
//! its reserved channel, so intake code can demultiplex on the channel name
//! before paying for a decode.

use crate::envelope::{
    Args, Envelope, SchemaVersion, FABRIC_SCHEMA_VERSION, PANEL_ENVELOPE_CHANNEL, REPLY_CHANNEL,
    REQUEST_CHANNEL,
};
use core_types::{PanelId, SessionId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Error when encoding or decoding a typed envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Unexpected channel: expected '{expected}', got '{found}'")]
    UnexpectedChannel {
        expected: &'static str,
        found: String,
    },

    #[error("Incompatible schema version: received {received}, supported {supported}")]
    IncompatibleSchema {
        received: SchemaVersion,
        supported: SchemaVersion,
    },

    #[error("Missing payload argument")]
    MissingPayload,

    #[error("Codec error: {0}")]
    Codec(String),
}

/// A request bound for the coordinating process
///
/// Carries the session ID the originator will use to match the eventual
/// reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Session awaiting the reply
    pub session_id: SessionId,
    /// Message name to dispatch at the coordinating process
    pub message: String,
    /// Request arguments
    pub args: Args,
}

impl RequestEnvelope {
    /// Creates a new request envelope
    pub fn new(session_id: SessionId, message: impl Into<String>, args: Args) -> Self {
        Self {
            session_id,
            message: message.into(),
            args,
        }
    }

    /// Wraps this request for the request-intake channel
    pub fn into_envelope(self) -> Result<Envelope, EnvelopeError> {
        encode(REQUEST_CHANNEL, &self)
    }

    /// Decodes a request from a request-intake envelope
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, EnvelopeError> {
        decode(REQUEST_CHANNEL, envelope)
    }
}

/// A reply bound for the originator of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// Session the reply settles
    pub session_id: SessionId,
    /// Reply arguments
    pub args: Args,
}

impl ReplyEnvelope {
    /// Creates a new reply envelope
    pub fn new(session_id: SessionId, args: Args) -> Self {
        Self { session_id, args }
    }

    /// Wraps this reply for the reply-intake channel
    pub fn into_envelope(self) -> Result<Envelope, EnvelopeError> {
        encode(REPLY_CHANNEL, &self)
    }

    /// Decodes a reply from a reply-intake envelope
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, EnvelopeError> {
        decode(REPLY_CHANNEL, envelope)
    }
}

/// A message addressed to a composite panel
///
/// Composite panels host their own routing inside the owning window, so
/// the wrapper preserves the panel identifier for local demultiplexing.
/// Simple panels receive the raw message instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelEnvelope {
    /// Target panel inside the owning window
    pub panel_id: PanelId,
    /// Message name for the panel
    pub message: String,
    /// Message arguments
    pub args: Args,
}

impl PanelEnvelope {
    /// Creates a new panel envelope
    pub fn new(panel_id: PanelId, message: impl Into<String>, args: Args) -> Self {
        Self {
            panel_id,
            message: message.into(),
            args,
        }
    }

    /// Wraps this payload for the panel-envelope channel
    pub fn into_envelope(self) -> Result<Envelope, EnvelopeError> {
        encode(PANEL_ENVELOPE_CHANNEL, &self)
    }

    /// Decodes a panel payload from a panel-envelope channel envelope
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, EnvelopeError> {
        decode(PANEL_ENVELOPE_CHANNEL, envelope)
    }
}

fn encode<T: Serialize>(channel: &'static str, payload: &T) -> Result<Envelope, EnvelopeError> {
    let value = serde_json::to_value(payload).map_err(|err| EnvelopeError::Codec(err.to_string()))?;
    Ok(Envelope::new(channel, Args::new().with_value(value)))
}

fn decode<T: DeserializeOwned>(
    channel: &'static str,
    envelope: &Envelope,
) -> Result<T, EnvelopeError> {
    if envelope.message != channel {
        return Err(EnvelopeError::UnexpectedChannel {
            expected: channel,
            found: envelope.message.clone(),
        });
    }
    if !envelope.schema_version.is_compatible_with(&FABRIC_SCHEMA_VERSION) {
        return Err(EnvelopeError::IncompatibleSchema {
            received: envelope.schema_version,
            supported: FABRIC_SCHEMA_VERSION,
        });
    }
    let value = envelope.args.get(0).ok_or(EnvelopeError::MissingPayload)?;
    serde_json::from_value(value.clone()).map_err(|err| EnvelopeError::Codec(err.to_string()))
}
