//! # sweep-storage - Storage Resource Deletion
//!
//! Deletes tables and blob containers from the local storage emulator over
//! its REST API, signing each request with the account's shared key.
//!
//! ## Public API
//!
//! - [`StorageClient`] - "delete if exists" for tables and containers
//! - [`EmulatorStorageClient`] - REST implementation
//! - [`StorageAccount`] - Account name, key and endpoints from a connection string
//! - [`validate_table_name()`] / [`validate_container_name()`] - Local name checks

pub mod auth;
pub mod client;
pub mod connection;
pub mod http;
pub mod names;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use client::{
    EmulatorStorageClient, LocalStorageClient, StorageClient, DEFAULT_REQUEST_TIMEOUT,
    STORAGE_API_VERSION,
};
pub use connection::{
    StorageAccount, DEVSTORE_ACCOUNT_KEY, DEVSTORE_ACCOUNT_NAME, DEVSTORE_BLOB_ENDPOINT,
    DEVSTORE_TABLE_ENDPOINT,
};
pub use names::{validate_container_name, validate_table_name};
