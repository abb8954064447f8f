//! Matrix homeserver adapter.

mod client;
mod dto;
mod sync;

pub use client::MatrixClient;
pub use sync::{SyncLoop, SyncSettings};
