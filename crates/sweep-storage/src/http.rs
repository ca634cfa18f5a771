//! Minimal HTTP/1.1 transport for the local emulator
//!
//! Requests carry no body and use `Connection: close`, so a response is read
//! until the emulator closes the socket. Only plain `http` endpoints are
//! supported.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use url::Url;

use sweep_core::prelude::*;

/// A body-less request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: &'static str,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl HttpRequest {
    pub fn new(method: &'static str, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Request path plus query, as sent on the request line
    fn target(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Serialize request line and headers
    pub fn to_wire(&self) -> Result<String> {
        let host = self
            .url
            .host_str()
            .ok_or_else(|| Error::storage(format!("endpoint has no host: {}", self.url)))?;
        let port = self
            .url
            .port_or_known_default()
            .ok_or_else(|| Error::storage(format!("endpoint has no port: {}", self.url)))?;

        let mut wire = format!("{} {} HTTP/1.1\r\n", self.method, self.target());
        wire.push_str(&format!("Host: {}:{}\r\n", host, port));
        for (name, value) in &self.headers {
            wire.push_str(&format!("{}: {}\r\n", name, value));
        }
        wire.push_str("Connection: close\r\n\r\n");
        Ok(wire)
    }
}

/// Send `request` and read the full response within `limit`
pub async fn send(request: &HttpRequest, limit: Duration) -> Result<HttpResponse> {
    if request.url.scheme() != "http" {
        return Err(Error::storage(format!(
            "unsupported endpoint scheme '{}' (only the local emulator over http is supported)",
            request.url.scheme()
        )));
    }

    let wire = request.to_wire()?;
    let host = request.url.host_str().unwrap_or("127.0.0.1").to_string();
    let port = request.url.port_or_known_default().unwrap_or(80);

    debug!("{} {}", request.method, request.url);

    let raw = timeout(limit, exchange(&host, port, wire.as_bytes()))
        .await
        .map_err(|_| Error::storage(format!("request to {} timed out", request.url)))??;

    parse_response(&raw)
}

async fn exchange(host: &str, port: u16, request: &[u8]) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| Error::storage(format!("cannot connect to {}:{}: {}", host, port, e)))?;

    stream.write_all(request).await?;
    stream.flush().await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    Ok(raw)
}

/// Parse status line, headers and body of a raw HTTP/1.1 response
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse> {
    let text = String::from_utf8_lossy(raw);
    let text: &str = &text;
    let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text, ""));
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| Error::storage("empty response from emulator"))?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(Error::storage(format!(
            "malformed status line '{}'",
            status_line
        )));
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| Error::storage(format!("malformed status line '{}'", status_line)))?;
    let reason = parts.next().unwrap_or_default().to_string();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    Ok(HttpResponse {
        status,
        reason,
        headers,
        body: body.to_string(),
    })
}
