//! Mathpix OCR API client.

mod client;

pub use client::{DEFAULT_ENDPOINT, MathpixClient};
