//! The sweep workflow
//!
//! ```text
//! version check → ensure running → delete tables → delete containers → (stop)
//! ```
//!
//! The version check and the start of the emulator gate everything else: if
//! either fails, nothing is deleted. Once deletion begins a failure on one
//! resource is recorded and the sweep moves on to the next.

use tokio::time::Instant;

use crate::config::Settings;
use crate::report::{DeletionStatus, ResourceKind, SweepReport};
use crate::request::SweepRequest;
use sweep_core::prelude::*;
use sweep_core::{MinimumVersion, VersionTriple, MINIMUM_EMULATOR_VERSION};
use sweep_emulator::{EmulatorProcess, EmulatorSupervisor, ProcessRunner, VersionProbe};
use sweep_storage::{EmulatorStorageClient, StorageClient};

/// Sweeper wired to the real emulator executable and REST API
pub type EmulatorSweeper = Sweeper<EmulatorProcess, EmulatorStorageClient>;

pub struct Sweeper<R, S> {
    probe: VersionProbe,
    minimum: MinimumVersion,
    supervisor: EmulatorSupervisor<R>,
    storage: S,
}

impl EmulatorSweeper {
    /// Build from settings; fails only on an invalid connection string
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let account = settings.storage.account()?;
        let config = settings.emulator.supervisor_config();

        Ok(Self::new(
            VersionProbe::new(config.executable.clone()),
            EmulatorSupervisor::from_config(config),
            EmulatorStorageClient::new(account),
        ))
    }
}

impl<R: ProcessRunner, S: StorageClient> Sweeper<R, S> {
    pub fn new(probe: VersionProbe, supervisor: EmulatorSupervisor<R>, storage: S) -> Self {
        Self {
            probe,
            minimum: MINIMUM_EMULATOR_VERSION,
            supervisor,
            storage,
        }
    }

    pub fn with_minimum_version(mut self, minimum: MinimumVersion) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn supervisor(&self) -> &EmulatorSupervisor<R> {
        &self.supervisor
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Installed version if it meets the minimum, else `RequirementsNotMet`
    pub fn check_requirements(&self) -> Result<VersionTriple> {
        let installed = self.probe.installed_version();
        if self.minimum.is_satisfied_by(installed) {
            Ok(installed)
        } else {
            Err(Error::requirements_not_met(installed, self.minimum))
        }
    }

    /// Run one sweep
    pub async fn run(&mut self, request: &SweepRequest) -> Result<SweepReport> {
        let version = self.check_requirements()?;
        info!("Storage emulator {} meets minimum {}", version, self.minimum);

        self.supervisor
            .ensure_running()
            .await
            .context("Storage emulator is not available")?;

        let mut report = SweepReport::new();
        self.delete_all(ResourceKind::Table, &request.tables, &mut report)
            .await;
        self.delete_all(ResourceKind::Container, &request.containers, &mut report)
            .await;

        if request.stop_after {
            if let Err(e) = self.supervisor.stop().await {
                error!("Failed to stop the storage emulator: {}", e);
                report.record_stop_failure(e.to_string());
            }
        }

        Ok(report)
    }

    async fn delete_all(&self, kind: ResourceKind, names: &[String], report: &mut SweepReport) {
        if names.is_empty() {
            return;
        }

        info!("Deleting {} {}(s)", names.len(), kind);
        let started = Instant::now();

        for name in names {
            let result = match kind {
                ResourceKind::Table => self.storage.delete_table_if_exists(name).await,
                ResourceKind::Container => self.storage.delete_container_if_exists(name).await,
            };

            let status = match result {
                Ok(true) => DeletionStatus::Deleted,
                Ok(false) => DeletionStatus::NotFound,
                Err(e) => {
                    warn!("Could not delete {} '{}': {}", kind, name, e);
                    DeletionStatus::Failed(e.to_string())
                }
            };
            debug!("{} '{}': {:?}", kind, name, status);
            report.record(kind, name.as_str(), status);
        }

        report.set_elapsed(kind, started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use sweep_emulator::test_utils::{fake_emulator_binary, ScriptedRunner};
    use sweep_emulator::{EmulatorCommand, SupervisorConfig, SupervisorState};
    use sweep_storage::test_utils::{DeleteCall, RecordingStorage};
    use tempfile::{tempdir, TempDir};

    fn install(dir: &TempDir, major: u16, minor: u16) -> std::path::PathBuf {
        let path = dir.path().join("AzureStorageEmulator.exe");
        std::fs::write(&path, fake_emulator_binary(major, minor, 0)).unwrap();
        path
    }

    fn sweeper(
        executable: &Path,
        runner: ScriptedRunner,
        storage: RecordingStorage,
    ) -> Sweeper<ScriptedRunner, RecordingStorage> {
        let config = SupervisorConfig {
            executable: executable.to_path_buf(),
            ..Default::default()
        };
        Sweeper::new(
            VersionProbe::new(executable),
            EmulatorSupervisor::new(runner, config),
            storage,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_emulator_fails_requirements_without_starting() {
        let dir = tempdir().unwrap();
        let mut sweeper = sweeper(
            &dir.path().join("missing.exe"),
            ScriptedRunner::always(false),
            RecordingStorage::new(),
        );

        let err = sweeper
            .run(&SweepRequest::new(Some("orders"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RequirementsNotMet { .. }));
        assert!(sweeper.supervisor().runner().calls().is_empty());
        assert!(sweeper.storage().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_emulator_fails_requirements() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 2);
        let mut sweeper = sweeper(&exe, ScriptedRunner::always(true), RecordingStorage::new());

        let err = sweeper.run(&SweepRequest::default()).await.unwrap_err();

        match err {
            Error::RequirementsNotMet { installed, .. } => {
                assert_eq!(installed, VersionTriple::new(5, 2, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_major_passes_requirements() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 6, 0);
        let sweeper = sweeper(&exe, ScriptedRunner::always(true), RecordingStorage::new());

        assert_eq!(sweeper.check_requirements().unwrap(), VersionTriple::new(6, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tables_deleted_before_containers() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 10);
        let storage = RecordingStorage::new()
            .with_tables(["orders"])
            .with_containers(["uploads"]);
        let mut sweeper = sweeper(&exe, ScriptedRunner::always(true), storage);

        let request = SweepRequest::new(Some("orders,audit"), Some("uploads"));
        let report = sweeper.run(&request).await.unwrap();

        assert_eq!(
            sweeper.storage().calls(),
            vec![
                DeleteCall::Table("orders".to_string()),
                DeleteCall::Table("audit".to_string()),
                DeleteCall::Container("uploads".to_string()),
            ]
        );
        assert_eq!(report.deleted(), 2);
        assert_eq!(report.not_found(), 1);
        assert!(!report.has_failures());
        assert_eq!(sweeper.supervisor().runner().count(EmulatorCommand::Start), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_the_sweep() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 3);
        let storage = RecordingStorage::new()
            .with_tables(["orders", "audit"])
            .failing("orders", 409);
        let mut sweeper = sweeper(&exe, ScriptedRunner::always(true), storage);

        let report = sweeper
            .run(&SweepRequest::new(Some("orders Bad_Name audit"), None))
            .await
            .unwrap();

        let statuses: Vec<_> = report.outcomes().iter().map(|o| o.status.clone()).collect();
        assert!(matches!(statuses[0], DeletionStatus::Failed(_)));
        assert!(matches!(statuses[1], DeletionStatus::Failed(_)));
        assert_eq!(statuses[2], DeletionStatus::Deleted);
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_emulator_is_started_first() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 3);
        let runner = ScriptedRunner::with_liveness([false, false, true]);
        let storage = RecordingStorage::new().with_containers(["uploads"]);
        let mut sweeper = sweeper(&exe, runner, storage);

        let report = sweeper
            .run(&SweepRequest::new(None, Some("uploads")))
            .await
            .unwrap();

        assert_eq!(report.deleted(), 1);
        assert_eq!(sweeper.supervisor().runner().count(EmulatorCommand::Start), 1);
        assert_eq!(sweeper.supervisor().state(), SupervisorState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_deletes_nothing() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 3);
        let runner = ScriptedRunner::always(false)
            .with_start_stderr("Error: Port conflict with existing application.");
        let mut sweeper = sweeper(&exe, runner, RecordingStorage::new());

        let err = sweeper
            .run(&SweepRequest::new(Some("orders"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StartFailure { .. }));
        assert!(err.is_fatal());
        assert!(sweeper.storage().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_sweep() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 3);
        // status before sweep, status before stop, then stopped
        let runner = ScriptedRunner::with_liveness([true, true, false]);
        let mut sweeper = sweeper(&exe, runner, RecordingStorage::new());

        let request = SweepRequest::new(Some("orders"), None).with_stop_after(true);
        let report = sweeper.run(&request).await.unwrap();

        assert_eq!(report.stop_failure(), None);
        assert_eq!(sweeper.supervisor().runner().count(EmulatorCommand::Stop), 1);
        assert_eq!(sweeper.supervisor().state(), SupervisorState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_failure_is_recorded() {
        let dir = tempdir().unwrap();
        let exe = install(&dir, 5, 3);
        let runner = ScriptedRunner::with_liveness([true, true, false])
            .with_stop_stderr("Error: Access is denied.");
        let mut sweeper = sweeper(&exe, runner, RecordingStorage::new());

        let request = SweepRequest::new(Some("orders"), None).with_stop_after(true);
        let report = sweeper.run(&request).await.unwrap();

        assert_eq!(
            report.stop_failure(),
            Some("Storage emulator failed to stop: Access is denied.")
        );
    }
}
