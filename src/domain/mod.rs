//! Domain layer with core entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{Credentials, IncomingEvent, OcrResult};
pub use errors::{MediaError, OcrError, PipelineError, ProtocolError};
pub use ports::{MessagingPort, OcrPort, Reply};
