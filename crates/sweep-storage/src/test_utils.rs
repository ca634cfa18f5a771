//! Test utilities for resource deletion
//!
//! [`RecordingStorage`] is an in-memory [`StorageClient`] holding a set of
//! existing tables and containers. It records every delete it receives.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use crate::client::StorageClient;
use crate::names::{validate_container_name, validate_table_name};
use sweep_core::prelude::*;

/// A delete received by [`RecordingStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteCall {
    Table(String),
    Container(String),
}

/// In-memory [`StorageClient`]
#[derive(Debug, Default)]
pub struct RecordingStorage {
    tables: Mutex<BTreeSet<String>>,
    containers: Mutex<BTreeSet<String>>,
    failures: HashMap<String, u16>,
    calls: Mutex<Vec<DeleteCall>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables<S: Into<String>>(self, tables: impl IntoIterator<Item = S>) -> Self {
        if let Ok(mut existing) = self.tables.lock() {
            existing.extend(tables.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_containers<S: Into<String>>(self, containers: impl IntoIterator<Item = S>) -> Self {
        if let Ok(mut existing) = self.containers.lock() {
            existing.extend(containers.into_iter().map(Into::into));
        }
        self
    }

    /// Deleting `name` (table or container) answers with HTTP `status`
    pub fn failing(mut self, name: impl Into<String>, status: u16) -> Self {
        self.failures.insert(name.into(), status);
        self
    }

    /// Deletes received so far, in order
    pub fn calls(&self) -> Vec<DeleteCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn tables(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn containers(&self) -> Vec<String> {
        self.containers
            .lock()
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, call: DeleteCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn remove(&self, set: &Mutex<BTreeSet<String>>, name: &str, kind: &str) -> Result<bool> {
        if let Some(status) = self.failures.get(name) {
            return Err(Error::storage_status(*status, format!("{} '{}'", kind, name)));
        }
        Ok(set.lock().map(|mut s| s.remove(name)).unwrap_or(false))
    }
}

impl StorageClient for RecordingStorage {
    async fn delete_table_if_exists(&self, name: &str) -> Result<bool> {
        self.record(DeleteCall::Table(name.to_string()));
        validate_table_name(name)?;
        self.remove(&self.tables, name, "table")
    }

    async fn delete_container_if_exists(&self, name: &str) -> Result<bool> {
        self.record(DeleteCall::Container(name.to_string()));
        validate_container_name(name)?;
        self.remove(&self.containers, name, "container")
    }
}
