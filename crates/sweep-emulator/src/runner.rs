//! Emulator process invocation
//!
//! Every call spawns exactly one child process, captures its standard output
//! and standard error in full, and awaits its exit before returning. The
//! emulator executable sits behind [`ProcessRunner`] so the supervisor can be
//! driven by a scripted fake in tests.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::command::EmulatorCommand;
use sweep_core::prelude::*;

/// Hide the console window the emulator would otherwise open on Windows
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Captured output of one emulator invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    /// Whether the process was observed to exit
    pub exited: bool,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessResult {
    /// Build a result for a process that exited with code 0
    pub fn exited(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exited: true,
            exit_code: Some(0),
        }
    }
}

/// Launches the emulator executable with a single command argument
#[trait_variant::make(ProcessRunner: Send)]
pub trait LocalProcessRunner {
    /// Run `command` to completion and capture both output streams.
    ///
    /// Fails with [`Error::LaunchFailure`] when the executable cannot be
    /// started. Never retried here.
    async fn run(&self, command: EmulatorCommand) -> Result<ProcessResult>;
}

/// [`ProcessRunner`] backed by the real emulator executable
#[derive(Debug, Clone)]
pub struct EmulatorProcess {
    executable: PathBuf,
}

impl EmulatorProcess {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, command: EmulatorCommand) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(command.as_arg())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }
}

impl ProcessRunner for EmulatorProcess {
    async fn run(&self, command: EmulatorCommand) -> Result<ProcessResult> {
        debug!(
            "Running emulator: {} {}",
            self.executable.display(),
            command.as_arg()
        );

        // output() closes stdin, drains both pipes and reaps the child, so no
        // handle outlives this call on any path.
        let output = self
            .command(command)
            .output()
            .await
            .map_err(|e| Error::launch_failure(&self.executable, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        trace!("emulator {} stdout: {}", command, stdout);
        if !stderr.is_empty() {
            debug!("emulator {} stderr: {}", command, stderr);
        }

        Ok(ProcessResult {
            stdout,
            stderr,
            exited: true,
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_constructor() {
        let result = ProcessResult::exited("IsRunning: True", "");
        assert!(result.exited);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "IsRunning: True");
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn test_emulator_process_keeps_path() {
        let process = EmulatorProcess::new("/opt/emulator/AzureStorageEmulator.exe");
        assert_eq!(
            process.executable(),
            Path::new("/opt/emulator/AzureStorageEmulator.exe")
        );
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_failure() {
        let process = EmulatorProcess::new("/definitely/not/here/AzureStorageEmulator.exe");
        let err = ProcessRunner::run(&process, EmulatorCommand::Status)
            .await
            .unwrap_err();

        match err {
            Error::LaunchFailure { path, .. } => {
                assert_eq!(
                    path,
                    PathBuf::from("/definitely/not/here/AzureStorageEmulator.exe")
                );
            }
            other => panic!("expected LaunchFailure, got {:?}", other),
        }
    }
}
