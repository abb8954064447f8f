//! Use case implementations.

mod ocr_event_handler;

pub use ocr_event_handler::{
    ACKNOWLEDGEMENT_REACTION, INTERNAL_ERROR_REPLY, OcrEventHandler, PipelineOutcome,
    UNENCRYPTED_ROOM_WARNING,
};
