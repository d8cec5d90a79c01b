/*!
 * Core Module
 * Fundamental types, configuration and error handling
 */

pub mod bincode;
pub mod config;
pub mod errors;
pub mod serde;

// Re-export for convenience
pub use config::{AccessConfig, BookmarkConfig, EraseConfig, XattrConfig};
pub use errors::*;
