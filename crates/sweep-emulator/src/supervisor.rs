//! Storage emulator supervisor
//!
//! Answers "is the emulator running?", starts or stops it, and waits a bounded
//! amount of time for the emulator to report the requested state.
//!
//! ```text
//! Unknown → Checking → {Running, Stopped} → Transitioning → {Running, Stopped, Failed}
//! ```
//!
//! After a start or stop is issued the supervisor polls `status` every
//! [`SupervisorConfig::poll_interval`] until the emulator reports the target
//! state or [`SupervisorConfig::timeout`] elapses. A populated error stream from
//! the start/stop command is authoritative: the operation fails with its
//! message even if the emulator eventually reports the target state.

use std::path::PathBuf;

use tokio::time::{sleep, Duration, Instant};

use crate::command::EmulatorCommand;
use crate::runner::{EmulatorProcess, ProcessRunner};
use crate::status::{parse_error, parse_status};
use sweep_core::prelude::*;

/// Install location of the storage emulator
pub const DEFAULT_EMULATOR_PATH: &str =
    r"C:\Program Files (x86)\Microsoft SDKs\Azure\Storage Emulator\AzureStorageEmulator.exe";

/// Delay between status polls while waiting for a transition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Budget for a start/stop transition to complete
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed inputs of a supervisor, read-only after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub executable: PathBuf,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EMULATOR_PATH),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Last state observed by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    #[default]
    Unknown,
    Checking,
    Running,
    Stopped,
    Transitioning,
    Failed,
}

impl SupervisorState {
    fn observed(running: bool) -> Self {
        if running {
            SupervisorState::Running
        } else {
            SupervisorState::Stopped
        }
    }
}

/// Drives the emulator executable through a [`ProcessRunner`]
#[derive(Debug)]
pub struct EmulatorSupervisor<R> {
    runner: R,
    config: SupervisorConfig,
    state: SupervisorState,
}

impl EmulatorSupervisor<EmulatorProcess> {
    /// Supervisor for the real executable named in `config`
    pub fn from_config(config: SupervisorConfig) -> Self {
        let runner = EmulatorProcess::new(config.executable.clone());
        Self::new(runner, config)
    }
}

impl<R: ProcessRunner> EmulatorSupervisor<R> {
    pub fn new(runner: R, config: SupervisorConfig) -> Self {
        Self {
            runner,
            config,
            state: SupervisorState::Unknown,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Query the emulator's liveness with a single `status` invocation
    pub async fn is_running(&mut self) -> Result<bool> {
        self.state = SupervisorState::Checking;
        let running = self.check().await.inspect_err(|_| {
            self.state = SupervisorState::Failed;
        })?;
        self.state = SupervisorState::observed(running);
        Ok(running)
    }

    /// Start the emulator unless it is already running
    pub async fn start(&mut self) -> Result<()> {
        self.transition(EmulatorCommand::Start).await
    }

    /// Stop the emulator unless it is already stopped
    pub async fn stop(&mut self) -> Result<()> {
        self.transition(EmulatorCommand::Stop).await
    }

    /// Gate for callers that need a live emulator before doing any work
    pub async fn ensure_running(&mut self) -> Result<()> {
        self.start().await
    }

    async fn transition(&mut self, command: EmulatorCommand) -> Result<()> {
        let target = command == EmulatorCommand::Start;

        if self.is_running().await? == target {
            debug!("Storage emulator already in requested state, skipping '{}'", command);
            return Ok(());
        }

        info!("Sending '{}' to storage emulator", command);
        self.state = SupervisorState::Transitioning;

        let outcome = self.issue_and_wait(command, target).await;
        self.state = match &outcome {
            Ok(()) => SupervisorState::observed(target),
            Err(_) => SupervisorState::Failed,
        };
        outcome
    }

    async fn issue_and_wait(&self, command: EmulatorCommand, target: bool) -> Result<()> {
        let result = self.runner.run(command).await?;
        let error = parse_error(&result.stderr);
        if !error.is_empty() {
            warn!("Storage emulator '{}' reported: {}", command, error);
        }

        let reached = self.wait_for(target).await?;

        if !error.is_empty() {
            return Err(match command {
                EmulatorCommand::Stop => Error::stop_failure(error),
                _ => Error::start_failure(error),
            });
        }

        if !reached {
            return Err(Error::timeout(command.as_arg(), self.config.timeout));
        }

        info!("Storage emulator '{}' completed", command);
        Ok(())
    }

    /// Poll until the emulator reports `target` or the budget runs out.
    ///
    /// Returns whether the target state was observed.
    async fn wait_for(&self, target: bool) -> Result<bool> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            if self.check().await? == target {
                debug!(
                    "Storage emulator reached target after {} poll(s) in {:?}",
                    polls,
                    started.elapsed()
                );
                return Ok(true);
            }

            if started.elapsed() >= self.config.timeout {
                warn!(
                    "Storage emulator did not reach target within {:?} ({} polls)",
                    self.config.timeout, polls
                );
                return Ok(false);
            }

            trace!("Waiting for storage emulator (poll {})", polls);
            sleep(self.config.poll_interval).await;
        }
    }

    async fn check(&self) -> Result<bool> {
        let result = self.runner.run(EmulatorCommand::Status).await?;
        parse_status(&result.stdout)
    }
}
