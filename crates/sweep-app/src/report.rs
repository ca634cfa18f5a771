//! Per-resource outcome of a sweep

use std::fmt;

use tokio::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Table,
    Container,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Table => write!(f, "table"),
            ResourceKind::Container => write!(f, "container"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionStatus {
    Deleted,
    NotFound,
    /// Error message; the sweep carried on
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOutcome {
    pub kind: ResourceKind,
    pub name: String,
    pub status: DeletionStatus,
}

impl fmt::Display for ResourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DeletionStatus::Deleted => write!(f, "{} {} deleted", self.kind, self.name),
            DeletionStatus::NotFound => {
                write!(f, "{} {} not deleted (does not exist)", self.kind, self.name)
            }
            DeletionStatus::Failed(reason) => {
                write!(f, "{} {} not deleted - {}", self.kind, self.name, reason)
            }
        }
    }
}

/// Everything a sweep did, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    outcomes: Vec<ResourceOutcome>,
    tables_elapsed: Duration,
    containers_elapsed: Duration,
    stop_failure: Option<String>,
}

impl SweepReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ResourceKind, name: impl Into<String>, status: DeletionStatus) {
        self.outcomes.push(ResourceOutcome {
            kind,
            name: name.into(),
            status,
        });
    }

    pub fn set_elapsed(&mut self, kind: ResourceKind, elapsed: Duration) {
        match kind {
            ResourceKind::Table => self.tables_elapsed = elapsed,
            ResourceKind::Container => self.containers_elapsed = elapsed,
        }
    }

    pub fn elapsed(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::Table => self.tables_elapsed,
            ResourceKind::Container => self.containers_elapsed,
        }
    }

    pub fn outcomes(&self) -> &[ResourceOutcome] {
        &self.outcomes
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(move |o| o.kind == kind)
    }

    pub fn deleted(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Deleted))
    }

    pub fn not_found(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::NotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// The emulator could not be stopped after the sweep
    pub fn record_stop_failure(&mut self, message: impl Into<String>) {
        self.stop_failure = Some(message.into());
    }

    pub fn stop_failure(&self) -> Option<&str> {
        self.stop_failure.as_deref()
    }

    /// One-line summary for a kind, e.g. `tables: 2 deleted, 1 not found in 35 ms`
    pub fn summary(&self, kind: ResourceKind) -> String {
        let outcomes: Vec<_> = self.of_kind(kind).collect();
        let deleted = outcomes
            .iter()
            .filter(|o| o.status == DeletionStatus::Deleted)
            .count();
        let not_found = outcomes
            .iter()
            .filter(|o| o.status == DeletionStatus::NotFound)
            .count();
        let failed = outcomes.len() - deleted - not_found;

        let mut line = format!("{}s: {} deleted, {} not found", kind, deleted, not_found);
        if failed > 0 {
            line.push_str(&format!(", {} failed", failed));
        }
        line.push_str(&format!(" in {} ms", self.elapsed(kind).as_millis()));
        line
    }

    fn count(&self, pred: impl Fn(&DeletionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
