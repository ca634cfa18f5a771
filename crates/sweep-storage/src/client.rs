//! Table and blob-container deletion
//!
//! Both operations are "delete if exists": a missing resource is reported as
//! `Ok(false)`, not as an error.

use chrono::Utc;
use tokio::time::Duration;
use url::Url;

use crate::auth::{self, AuthScheme};
use crate::connection::StorageAccount;
use crate::http::{self, HttpRequest, HttpResponse};
use crate::names::{validate_container_name, validate_table_name};
use sweep_core::prelude::*;

/// Storage REST API version (the reason the emulator must be at least 5.3)
pub const STORAGE_API_VERSION: &str = "2017-04-17";

/// Per-request budget
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_ACCEPTED: u16 = 202;
const STATUS_NO_CONTENT: u16 = 204;
const STATUS_NOT_FOUND: u16 = 404;

/// Deletes storage resources by name
#[trait_variant::make(StorageClient: Send)]
pub trait LocalStorageClient {
    /// Delete a table; `Ok(false)` when it did not exist
    async fn delete_table_if_exists(&self, name: &str) -> Result<bool>;

    /// Delete a blob container; `Ok(false)` when it did not exist
    async fn delete_container_if_exists(&self, name: &str) -> Result<bool>;
}

/// [`StorageClient`] speaking the storage REST API to the emulator
#[derive(Debug, Clone)]
pub struct EmulatorStorageClient {
    account: StorageAccount,
    request_timeout: Duration,
}

impl EmulatorStorageClient {
    pub fn new(account: StorageAccount) -> Self {
        Self {
            account,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn account(&self) -> &StorageAccount {
        &self.account
    }

    /// `DELETE {table}/Tables('name')`, signed with `SharedKeyLite`
    pub fn table_delete_request(&self, name: &str, date: &str) -> Result<HttpRequest> {
        let url = append_segment(&self.account.table_endpoint, &format!("Tables('{}')", name))?;

        let canonical = auth::canonicalized_resource_lite(&self.account.name, &url);
        let string_to_sign = auth::shared_key_lite_table_string_to_sign(date, &canonical);
        let signature = auth::sign(self.account.key(), &string_to_sign)?;

        Ok(HttpRequest::new("DELETE", url)
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Accept", "application/json;odata=nometadata")
            .header("Content-Length", "0")
            .header(
                "Authorization",
                auth::authorization(AuthScheme::SharedKeyLite, &self.account.name, &signature),
            ))
    }

    /// `DELETE {blob}/name?restype=container`, signed with `SharedKey`
    pub fn container_delete_request(&self, name: &str, date: &str) -> Result<HttpRequest> {
        let mut url = append_segment(&self.account.blob_endpoint, name)?;
        url.set_query(Some("restype=container"));

        let request = HttpRequest::new("DELETE", url)
            .header("x-ms-date", date)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Content-Length", "0");

        let canonical = auth::canonicalized_resource(&self.account.name, &request.url);
        let string_to_sign =
            auth::shared_key_string_to_sign(request.method, &request.headers, &canonical);
        let signature = auth::sign(self.account.key(), &string_to_sign)?;

        Ok(request.header(
            "Authorization",
            auth::authorization(AuthScheme::SharedKey, &self.account.name, &signature),
        ))
    }

    async fn delete(&self, request: HttpRequest, resource: String, success: u16) -> Result<bool> {
        let response = http::send(&request, self.request_timeout).await?;
        interpret_delete(&response, &resource, success)
    }
}

impl StorageClient for EmulatorStorageClient {
    async fn delete_table_if_exists(&self, name: &str) -> Result<bool> {
        validate_table_name(name)?;
        let request = self.table_delete_request(name, &rfc1123_now())?;
        self.delete(request, format!("table '{}'", name), STATUS_NO_CONTENT)
            .await
    }

    async fn delete_container_if_exists(&self, name: &str) -> Result<bool> {
        validate_container_name(name)?;
        let request = self.container_delete_request(name, &rfc1123_now())?;
        self.delete(request, format!("container '{}'", name), STATUS_ACCEPTED)
            .await
    }
}

/// Map a delete response to "deleted" / "did not exist" / error
fn interpret_delete(response: &HttpResponse, resource: &str, success: u16) -> Result<bool> {
    match response.status {
        status if status == success => {
            debug!("Deleted {}", resource);
            Ok(true)
        }
        STATUS_NOT_FOUND => {
            debug!("{} does not exist", resource);
            Ok(false)
        }
        status => {
            warn!(
                "Deleting {} failed: HTTP {} {} ({})",
                resource,
                status,
                response.reason,
                response.header("x-ms-error-code").unwrap_or("no error code")
            );
            Err(Error::storage_status(status, resource))
        }
    }
}

fn append_segment(endpoint: &Url, segment: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("endpoint cannot be a base URL: {}", endpoint)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "Sat, 17 Oct 2026 10:00:00 GMT";

    fn client() -> EmulatorStorageClient {
        EmulatorStorageClient::new(StorageAccount::development().unwrap())
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_table_request_target() {
        let request = client().table_delete_request("orders", DATE).unwrap();
        assert_eq!(
            request.url.as_str(),
            "http://127.0.0.1:10002/devstoreaccount1/Tables('orders')"
        );
        assert_eq!(request.method, "DELETE");
    }

    #[test]
    fn test_table_request_is_signed_with_shared_key_lite() {
        let client = client();
        let request = client.table_delete_request("orders", DATE).unwrap();

        let expected = auth::sign(
            client.account().key(),
            &format!(
                "{}\n/devstoreaccount1/devstoreaccount1/Tables('orders')",
                DATE
            ),
        )
        .unwrap();
        let authorization = request
            .headers
            .iter()
            .find(|(n, _)| n == "Authorization")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(
            authorization,
            format!("SharedKeyLite devstoreaccount1:{}", expected)
        );
    }

    #[test]
    fn test_container_request_target() {
        let request = client().container_delete_request("uploads", DATE).unwrap();
        assert_eq!(
            request.url.as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/uploads?restype=container"
        );
    }

    #[test]
    fn test_container_request_is_signed_with_shared_key() {
        let client = client();
        let request = client.container_delete_request("uploads", DATE).unwrap();

        let string_to_sign = format!(
            "DELETE\n\n\n\n\n\n\n\n\n\n\n\nx-ms-date:{}\nx-ms-version:{}\n\
             /devstoreaccount1/devstoreaccount1/uploads\nrestype:container",
            DATE, STORAGE_API_VERSION
        );
        let expected = auth::sign(client.account().key(), &string_to_sign).unwrap();

        assert!(request
            .headers
            .contains(&("Authorization".to_string(), format!("SharedKey devstoreaccount1:{}", expected))));
    }

    #[test]
    fn test_interpret_delete() {
        assert!(interpret_delete(&response(204), "table 'orders'", STATUS_NO_CONTENT).unwrap());
        assert!(!interpret_delete(&response(404), "table 'orders'", STATUS_NO_CONTENT).unwrap());

        let err = interpret_delete(&response(409), "table 'orders'", STATUS_NO_CONTENT).unwrap_err();
        assert!(matches!(err, Error::StorageStatus { status: 409, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_rfc1123_format() {
        let date = rfc1123_now();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), DATE.len());
    }

    #[tokio::test]
    async fn test_invalid_name_never_reaches_the_network() {
        let err = StorageClient::delete_container_if_exists(&client(), "Bad_Name")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResourceName { .. }));
    }
}
