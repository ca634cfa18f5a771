//! # sweep-emulator - Storage Emulator Supervision
//!
//! Detects whether the local storage emulator is alive, starts or stops it
//! with a bounded wait, and reads its installed version.
//!
//! Depends on [`sweep_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Process Invocation
//! - [`ProcessRunner`] - Run one emulator command to completion
//! - [`EmulatorProcess`] - Runner backed by the real executable
//! - [`EmulatorCommand`] - `start` / `stop` / `status`
//!
//! ### Status Parsing
//! - [`parse_status()`] - `IsRunning` flag from status output
//! - [`parse_error()`] - Surfaced message from the error stream
//!
//! ### Supervision
//! - [`EmulatorSupervisor`] - `is_running`, `start`, `stop`, `ensure_running`
//! - [`SupervisorConfig`] - Executable path, poll interval, timeout budget
//!
//! ### Version
//! - [`VersionProbe`] - Installed version from executable metadata
//! - [`parse_file_version()`] - File version from a PE `RT_VERSION` resource

pub mod command;
pub mod runner;
pub mod status;
pub mod supervisor;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod version;

// Public API re-exports
pub use command::EmulatorCommand;
pub use runner::{EmulatorProcess, LocalProcessRunner, ProcessResult, ProcessRunner};
pub use status::{parse_error, parse_status, EmulatorStatus};
pub use supervisor::{
    EmulatorSupervisor, SupervisorConfig, SupervisorState, DEFAULT_EMULATOR_PATH,
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};
pub use version::{parse_file_version, VersionProbe};
