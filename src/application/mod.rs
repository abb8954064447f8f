//! Application layer with use cases and services.

/// Pipeline services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{MediaResolver, ResolvedMedia, ResponseFormatter};
pub use use_cases::{OcrEventHandler, PipelineOutcome};
