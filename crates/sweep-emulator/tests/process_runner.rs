//! Integration tests driving a stand-in emulator script through the real runner

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serial_test::serial;
use sweep_emulator::{EmulatorCommand, EmulatorProcess, EmulatorSupervisor, SupervisorConfig};
use tempfile::TempDir;
use tokio::time::Duration;

/// Write an executable shell script that answers `status`, `start` and `stop`
/// and keeps its liveness in a marker file next to itself.
fn create_fake_emulator(dir: &Path, start_stderr: &str) -> PathBuf {
    let script = dir.join("fake-emulator");
    let marker = dir.join("running");
    let body = format!(
        r#"#!/bin/sh
case "$1" in
  status)
    echo "Fake Storage Emulator 5.10.0.0 command line tool"
    if [ -f "{marker}" ]; then echo "IsRunning: True"; else echo "IsRunning: False"; fi
    echo "BlobEndpoint: http://127.0.0.1:10000/"
    ;;
  start)
    touch "{marker}"
    printf '%s' "{start_stderr}" >&2
    ;;
  stop)
    rm -f "{marker}"
    ;;
  *)
    echo "Error: unknown command $1" >&2
    exit 1
    ;;
esac
"#,
        marker = marker.display(),
        start_stderr = start_stderr,
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn config(executable: PathBuf) -> SupervisorConfig {
    SupervisorConfig {
        executable,
        poll_interval: Duration::from_millis(20),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
#[serial]
async fn test_status_output_is_captured() {
    let temp = TempDir::new().unwrap();
    let script = create_fake_emulator(temp.path(), "");

    let process = EmulatorProcess::new(&script);
    let result = sweep_emulator::ProcessRunner::run(&process, EmulatorCommand::Status)
        .await
        .unwrap();

    assert!(result.exited);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.contains("IsRunning: False"));
    assert!(result.stderr.is_empty());
}

#[tokio::test]
#[serial]
async fn test_start_then_stop_round_trip() {
    let temp = TempDir::new().unwrap();
    let script = create_fake_emulator(temp.path(), "");
    let mut supervisor = EmulatorSupervisor::from_config(config(script));

    assert!(!supervisor.is_running().await.unwrap());

    supervisor.ensure_running().await.unwrap();
    assert!(supervisor.is_running().await.unwrap());

    supervisor.stop().await.unwrap();
    assert!(!supervisor.is_running().await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_start_with_error_output_fails() {
    let temp = TempDir::new().unwrap();
    let script = create_fake_emulator(temp.path(), "Error: port already in use");
    let mut supervisor = EmulatorSupervisor::from_config(config(script));

    let err = supervisor.start().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Storage emulator failed to start: port already in use"
    );
}

#[tokio::test]
#[serial]
async fn test_missing_executable_cannot_be_started() {
    let temp = TempDir::new().unwrap();
    let mut supervisor =
        EmulatorSupervisor::from_config(config(temp.path().join("does-not-exist")));

    let err = supervisor.ensure_running().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, sweep_core::Error::LaunchFailure { .. }));
}
