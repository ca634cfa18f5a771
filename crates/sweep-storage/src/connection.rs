//! Storage connection strings
//!
//! Supports the development shortcut and explicit account settings:
//!
//! ```text
//! UseDevelopmentStorage=true
//! DefaultEndpointsProtocol=http;AccountName=devstoreaccount1;AccountKey=...;
//!     BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1;
//!     TableEndpoint=http://127.0.0.1:10002/devstoreaccount1;
//! ```

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use url::Url;

use sweep_core::prelude::*;

/// Well-known account served by the storage emulator
pub const DEVSTORE_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known (public) key of the emulator account
pub const DEVSTORE_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

pub const DEVSTORE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
pub const DEVSTORE_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Account credentials and service endpoints
#[derive(Clone, PartialEq, Eq)]
pub struct StorageAccount {
    pub name: String,
    key: Vec<u8>,
    pub blob_endpoint: Url,
    pub table_endpoint: Url,
}

impl StorageAccount {
    pub fn new(
        name: impl Into<String>,
        key_base64: &str,
        blob_endpoint: Url,
        table_endpoint: Url,
    ) -> Result<Self> {
        let key = BASE64
            .decode(key_base64.trim())
            .map_err(|e| Error::config(format!("AccountKey is not valid base64: {}", e)))?;

        Ok(Self {
            name: name.into(),
            key,
            blob_endpoint,
            table_endpoint,
        })
    }

    /// The emulator's well-known development account
    pub fn development() -> Result<Self> {
        Self::new(
            DEVSTORE_ACCOUNT_NAME,
            DEVSTORE_ACCOUNT_KEY,
            Url::parse(DEVSTORE_BLOB_ENDPOINT)?,
            Url::parse(DEVSTORE_TABLE_ENDPOINT)?,
        )
    }

    /// Decoded account key used for request signing
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Parse a `key=value;...` connection string
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let mut settings = ConnectionSettings::default();

        for pair in connection_string.split(';').map(str::trim) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::config(format!("malformed connection string segment '{}'", pair))
            })?;
            settings.set(key.trim(), value.trim());
        }

        if settings.use_development_storage {
            return Self::development();
        }

        let name = settings
            .account_name
            .ok_or_else(|| Error::config("connection string is missing AccountName"))?;
        let key = settings
            .account_key
            .ok_or_else(|| Error::config("connection string is missing AccountKey"))?;

        let protocol = settings.protocol.as_deref().unwrap_or("https");
        let suffix = settings
            .endpoint_suffix
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);

        let blob_endpoint = match settings.blob_endpoint {
            Some(endpoint) => Url::parse(&endpoint)?,
            None => Url::parse(&format!("{}://{}.blob.{}", protocol, name, suffix))?,
        };
        let table_endpoint = match settings.table_endpoint {
            Some(endpoint) => Url::parse(&endpoint)?,
            None => Url::parse(&format!("{}://{}.table.{}", protocol, name, suffix))?,
        };

        Self::new(name, &key, blob_endpoint, table_endpoint)
    }
}

impl FromStr for StorageAccount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_connection_string(s)
    }
}

// Never print the key
impl fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .field("table_endpoint", &self.table_endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ConnectionSettings {
    use_development_storage: bool,
    account_name: Option<String>,
    account_key: Option<String>,
    protocol: Option<String>,
    endpoint_suffix: Option<String>,
    blob_endpoint: Option<String>,
    table_endpoint: Option<String>,
}

impl ConnectionSettings {
    fn set(&mut self, key: &str, value: &str) {
        let value = Some(value.to_string());
        match key.to_ascii_lowercase().as_str() {
            "usedevelopmentstorage" => {
                self.use_development_storage =
                    value.is_some_and(|v| v.eq_ignore_ascii_case("true"));
            }
            "accountname" => self.account_name = value,
            "accountkey" => self.account_key = value,
            "defaultendpointsprotocol" => self.protocol = value,
            "endpointsuffix" => self.endpoint_suffix = value,
            "blobendpoint" => self.blob_endpoint = value,
            "tableendpoint" => self.table_endpoint = value,
            other => debug!("Ignoring connection string setting '{}'", other),
        }
    }
}
