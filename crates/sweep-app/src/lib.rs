//! # sweep-app - Sweep Orchestration
//!
//! Loads settings, turns command-line lists into a [`SweepRequest`] and runs
//! the [`Sweeper`] workflow, producing a [`SweepReport`].
//!
//! Depends on [`sweep_emulator`] for emulator supervision and
//! [`sweep_storage`] for resource deletion.

pub mod config;
pub mod report;
pub mod request;
pub mod workflow;

pub use config::{load_settings, Settings, CONFIG_FILENAME};
pub use report::{DeletionStatus, ResourceKind, ResourceOutcome, SweepReport};
pub use request::{parse_resource_list, SweepRequest};
pub use workflow::{EmulatorSweeper, Sweeper};
