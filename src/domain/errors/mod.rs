//! Domain error types.

mod media_error;
mod ocr_error;
mod pipeline_error;
mod protocol_error;

pub use media_error::MediaError;
pub use ocr_error::OcrError;
pub use pipeline_error::PipelineError;
pub use protocol_error::ProtocolError;
