//! Configuration file parsing for storage-sweep
//!
//! Supports `storage-sweep.toml` with `[storage]` and `[emulator]` tables.

pub mod settings;
pub mod types;

pub use settings::{load_settings, CONFIG_FILENAME};
pub use types::*;
