//! Broker message envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vicinity_core::UserId;

/// What a [`Message`] asks for, or reports.
///
/// Encoded on the wire as a small integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageKind {
    /// A failure reply; `body` carries the error text.
    Error,
    /// A user reports their position; `body` is `{"lat": .., "long": ..}`.
    SendLocation,
    /// A user asks who is near them; the reply `body` is a JSON array of
    /// user ids.
    RequestNearby,
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> u8 {
        match kind {
            MessageKind::Error => 0,
            MessageKind::SendLocation => 1,
            MessageKind::RequestNearby => 2,
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = UnknownKind;

    fn try_from(v: u8) -> Result<Self, UnknownKind> {
        match v {
            0 => Ok(MessageKind::Error),
            1 => Ok(MessageKind::SendLocation),
            2 => Ok(MessageKind::RequestNearby),
            other => Err(UnknownKind(other)),
        }
    }
}

/// A wire value that names no [`MessageKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown message kind {0}")]
pub struct UnknownKind(pub u8);

/// One message exchanged with the broker.
///
/// Serializes as `{"id", "receiver", "user", "eventType", "body"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Broker-assigned id; replies reuse the id of the request.
    pub id: String,
    /// Opaque routing hint for whoever consumes the reply.
    pub receiver: String,
    /// The user the message is about.
    pub user: UserId,
    /// What the message asks for.
    #[serde(rename = "eventType")]
    pub kind: MessageKind,
    /// Kind-specific payload, usually JSON text.
    pub body: String,
}

/// A message received from the broker.
pub type InboundMessage = Message;

/// A message to publish back to the broker.
pub type OutboundMessage = Message;

impl Message {
    /// A reply to `self` with the given kind and body.
    pub fn reply(&self, kind: MessageKind, body: String) -> OutboundMessage {
        Message {
            id: self.id.clone(),
            receiver: self.receiver.clone(),
            user: self.user.clone(),
            kind,
            body,
        }
    }
}
