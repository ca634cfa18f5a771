//! End-to-end exit codes of the sweep entry point that never launch a process

use std::path::Path;

use clap::Parser;
use storage_sweep::cli::{EXIT_CONFIG_ERROR, EXIT_REQUIREMENTS_NOT_MET};
use storage_sweep::{run, Args};
use sweep_emulator::test_utils::fake_emulator_binary;
use tempfile::tempdir;

fn write_config(dir: &Path, emulator: &Path, connection_string: &str) -> std::path::PathBuf {
    let path = dir.join("storage-sweep.toml");
    let content = format!(
        "[storage]\nconnection_string = '{}'\n\n[emulator]\npath = '{}'\ntimeout_secs = 1\n",
        connection_string,
        emulator.display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn args(config: &Path) -> Args {
    Args::try_parse_from([
        "storage-sweep",
        "--tables",
        "orders",
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_missing_emulator_is_requirements_not_met() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &dir.path().join("AzureStorageEmulator.exe"),
        "UseDevelopmentStorage=true",
    );

    assert_eq!(run(args(&config)).await, EXIT_REQUIREMENTS_NOT_MET);
}

#[tokio::test]
async fn test_outdated_emulator_is_requirements_not_met() {
    let dir = tempdir().unwrap();
    let exe = dir.path().join("AzureStorageEmulator.exe");
    std::fs::write(&exe, fake_emulator_binary(5, 2, 7)).unwrap();
    let config = write_config(dir.path(), &exe, "UseDevelopmentStorage=true");

    assert_eq!(run(args(&config)).await, EXIT_REQUIREMENTS_NOT_MET);
}

#[tokio::test]
async fn test_invalid_connection_string_is_config_error() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &dir.path().join("AzureStorageEmulator.exe"),
        "AccountName=devstoreaccount1",
    );

    assert_eq!(run(args(&config)).await, EXIT_CONFIG_ERROR);
}
