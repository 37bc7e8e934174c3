pub mod builder;
pub mod client;
pub mod types;

// Re-export main types for easier importing
pub use crate::core::types::Params;
pub use builder::{build_connector, BitcoindeBuilder};
pub use client::{handle_response, BitcoindeClient};
pub use types::ApiErrorEntry;
