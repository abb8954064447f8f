//! Messaging protocol port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::{EventId, MxcUri, RoomId};
use crate::domain::errors::ProtocolError;

/// A message to post into a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body, HTML markup when `allow_html` is set.
    pub body: String,
    /// Whether the body should be rendered as HTML.
    pub allow_html: bool,
}

impl Reply {
    /// Creates a plain text reply.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            allow_html: false,
        }
    }

    /// Creates an HTML reply.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            allow_html: true,
        }
    }
}

/// Port for the operations the bot performs against the chat protocol.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Marks an event as read.
    async fn mark_read(&self, room_id: &RoomId, event_id: &EventId) -> Result<(), ProtocolError>;

    /// Annotates an event with a reaction key.
    async fn react(
        &self,
        room_id: &RoomId,
        event_id: &EventId,
        key: &str,
    ) -> Result<EventId, ProtocolError>;

    /// Posts a message into a room.
    async fn respond(&self, room_id: &RoomId, reply: &Reply) -> Result<EventId, ProtocolError>;

    /// Redacts an event previously sent by the bot.
    async fn redact(&self, room_id: &RoomId, event_id: &EventId) -> Result<(), ProtocolError>;

    /// Downloads a media blob.
    async fn download_media(&self, uri: &MxcUri) -> Result<Bytes, ProtocolError>;
}
