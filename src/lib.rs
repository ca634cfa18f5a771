//! storage-sweep library
//!
//! Thin layer over the workspace crates so the binary and the integration
//! tests share one entry point.

pub mod cli;

pub use cli::{exit_code, run, Args};
