use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Matrix room identifier (`!opaque:server`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw room identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matrix event identifier (`$opaque`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a raw event identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matrix content URI (`mxc://<server-name>/<media-id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MxcUri {
    server_name: String,
    media_id: String,
}

impl MxcUri {
    const SCHEME: &'static str = "mxc://";

    /// Parses a content URI, returning `None` if it is malformed.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(Self::SCHEME)?;
        let (server_name, media_id) = rest.split_once('/')?;

        if server_name.is_empty() || media_id.is_empty() || media_id.contains('/') {
            return None;
        }

        Some(Self {
            server_name: server_name.to_string(),
            media_id: media_id.to_string(),
        })
    }

    /// Returns the origin server name.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Returns the media id.
    #[must_use]
    pub fn media_id(&self) -> &str {
        &self.media_id
    }
}

impl std::fmt::Display for MxcUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}/{}", Self::SCHEME, self.server_name, self.media_id)
    }
}

/// Matrix message type carried in `content.msgtype`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum MessageType {
    #[default]
    Text,
    Notice,
    Emote,
    Image,
    File,
    Audio,
    Video,
    Location,
    /// Any message type this bot does not know about.
    Other(String),
}

impl MessageType {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "m.text",
            Self::Notice => "m.notice",
            Self::Emote => "m.emote",
            Self::Image => "m.image",
            Self::File => "m.file",
            Self::Audio => "m.audio",
            Self::Video => "m.video",
            Self::Location => "m.location",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "m.text" => Self::Text,
            "m.notice" => Self::Notice,
            "m.emote" => Self::Emote,
            "m.image" => Self::Image,
            "m.file" => Self::File,
            "m.audio" => Self::Audio,
            "m.video" => Self::Video,
            "m.location" => Self::Location,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl Serialize for MessageType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON Web Key protecting an encrypted attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type, always `oct` for attachments.
    pub kty: String,
    /// Algorithm, always `A256CTR` for attachments.
    pub alg: String,
    /// URL-safe base64 encoded key material.
    pub k: String,
    /// Permitted operations.
    #[serde(default)]
    pub key_ops: Vec<String>,
    /// Extractable flag.
    #[serde(default)]
    pub ext: bool,
}

/// Descriptor for an attachment that was encrypted client-side
/// before upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    /// `mxc://` location of the ciphertext.
    #[serde(default)]
    pub url: Option<String>,
    /// Decryption key.
    pub key: JsonWebKey,
    /// Base64 encoded 16-byte initialization vector.
    pub iv: String,
    /// Base64 encoded digests of the ciphertext, keyed by algorithm.
    #[serde(default)]
    pub hashes: HashMap<String, String>,
    /// Attachment encryption version.
    #[serde(default)]
    pub v: Option<String>,
}

impl EncryptedFile {
    /// Returns the declared SHA-256 digest of the ciphertext.
    #[must_use]
    pub fn sha256(&self) -> Option<&str> {
        self.hashes.get("sha256").map(String::as_str)
    }
}

/// Content of an `m.room.message` event, reduced to the fields the bot reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    /// Message type.
    #[serde(default)]
    pub msgtype: MessageType,
    /// Plain text body, the file name for media messages.
    #[serde(default)]
    pub body: String,
    /// `mxc://` location of unencrypted media.
    #[serde(default)]
    pub url: Option<String>,
    /// Encrypted attachment descriptor.
    #[serde(default)]
    pub file: Option<EncryptedFile>,
}

impl MessageContent {
    /// Returns true for `m.image` messages.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.msgtype == MessageType::Image
    }
}

/// A room message received from the homeserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    /// Room the event was sent in.
    pub room_id: RoomId,
    /// Identifier of the event.
    pub event_id: EventId,
    /// Fully qualified sender user id.
    pub sender: String,
    /// Message content.
    pub content: MessageContent,
}

impl IncomingEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        room_id: RoomId,
        event_id: EventId,
        sender: impl Into<String>,
        content: MessageContent,
    ) -> Self {
        Self {
            room_id,
            event_id,
            sender: sender.into(),
            content,
        }
    }
}
