use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `/sync` response, reduced to joined-room timelines and invites.
#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    /// Token for the next incremental sync.
    pub next_batch: String,
    /// Per-room updates.
    #[serde(default)]
    pub rooms: Option<SyncRooms>,
}

/// Room sections of a sync response.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRooms {
    /// Rooms the user is joined to.
    #[serde(default)]
    pub join: HashMap<String, JoinedRoom>,
    /// Rooms the user is invited to.
    #[serde(default)]
    pub invite: HashMap<String, serde_json::Value>,
}

/// Update for one joined room.
#[derive(Debug, Default, Deserialize)]
pub struct JoinedRoom {
    /// New timeline events.
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

/// Timeline slice of a joined room.
#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    /// Events in chronological order.
    #[serde(default)]
    pub events: Vec<RoomEvent>,
}

/// A timeline event with its content left unparsed.
#[derive(Debug, Deserialize)]
pub struct RoomEvent {
    /// Event type, for example `m.room.message`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Sender user id.
    #[serde(default)]
    pub sender: Option<String>,
    /// Event id.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Raw event content.
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Standard Matrix error body.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error code such as `M_FORBIDDEN`.
    #[serde(default)]
    pub errcode: String,
    /// Human readable message.
    #[serde(default)]
    pub error: String,
    /// Back-off hint for `M_LIMIT_EXCEEDED`.
    #[serde(default)]
    pub retry_after_ms: Option<u64>,
}

/// Response of send endpoints.
#[derive(Debug, Deserialize)]
pub struct SendResponse {
    /// Id of the created event.
    pub event_id: String,
}

/// `m.room.message` content posted by the bot.
#[derive(Debug, Serialize)]
pub struct NoticeContent<'a> {
    /// Always `m.notice` so other bots ignore the reply.
    pub msgtype: &'static str,
    /// Plain text body.
    pub body: &'a str,
    /// `org.matrix.custom.html` when `formatted_body` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<&'a str>,
}

/// `m.reaction` content.
#[derive(Debug, Serialize)]
pub struct ReactionContent<'a> {
    /// Relation to the annotated event.
    #[serde(rename = "m.relates_to")]
    pub relates_to: Annotation<'a>,
}

/// Annotation relation.
#[derive(Debug, Serialize)]
pub struct Annotation<'a> {
    /// Always `m.annotation`.
    pub rel_type: &'static str,
    /// Annotated event id.
    pub event_id: &'a str,
    /// Reaction key.
    pub key: &'a str,
}
