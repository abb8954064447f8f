//! Domain entity definitions.

mod credentials;
mod event;
mod ocr;

pub use credentials::{Credentials, Secret};
pub use event::{
    EncryptedFile, EventId, IncomingEvent, JsonWebKey, MessageContent, MessageType, MxcUri,
    RoomId,
};
pub use ocr::{FormattingMode, OcrOptions, OcrResult};
