//! Attaching to an already running browser's DevTools endpoint.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{Result, ToolboxError};

/// Timeout for the `/json/version` liveness probe.
pub const REMOTE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A validated `host:port` pointing at a browser's remote debugging interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    raw: String,
    host: String,
    port: String,
    base_url: String,
}

impl RemoteEndpoint {
    /// Validates `host:port` (an `http://` or `https://` prefix is tolerated)
    /// and normalizes it to an http address.
    pub fn parse(value: &str) -> Result<Self> {
        let (scheme, authority) = if let Some(rest) = value.strip_prefix("http://") {
            ("http://", rest)
        } else if let Some(rest) = value.strip_prefix("https://") {
            ("https://", rest)
        } else {
            ("http://", value)
        };
        let authority = authority.trim_end_matches('/');

        if !authority.contains(':') {
            return Err(ToolboxError::InvalidRemoteEndpoint {
                value: value.to_string(),
                expected: "localhost:9222",
            });
        }
        let mut parts = authority.split(':');
        let (host, port) = match (parts.next(), parts.next(), parts.next()) {
            (Some(host), Some(port), None) if !host.is_empty() && !port.is_empty() => (host, port),
            _ => {
                return Err(ToolboxError::InvalidRemoteEndpoint {
                    value: value.to_string(),
                    expected: "host:port",
                })
            }
        };

        Ok(Self {
            raw: value.to_string(),
            host: host.to_string(),
            port: port.to_string(),
            base_url: format!("{scheme}{host}:{port}"),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Normalized http(s) address of the endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn version_url(&self) -> String {
        format!("{}/json/version", self.base_url)
    }

    /// The websocket URL reported by the browser, re-pointed at the host and
    /// port the user supplied. Browsers report their own bind address, which
    /// is not reachable from outside containers or port forwards.
    pub fn websocket_url(&self, version: &BrowserVersion) -> Result<String> {
        let reported = version.web_socket_debugger_url.as_deref().ok_or_else(|| {
            ToolboxError::browser(format!(
                "{} did not report a webSocketDebuggerUrl",
                self.version_url()
            ))
        })?;
        let mut url = Url::parse(reported)?;
        url.set_host(Some(&self.host))?;
        if let Ok(port) = self.port.parse::<u16>() {
            url.set_port(Some(port))
                .map_err(|_| ToolboxError::browser(format!("cannot set port on {reported}")))?;
        }
        Ok(url.to_string())
    }
}

impl FromStr for RemoteEndpoint {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Payload of `GET /json/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser", default)]
    pub browser: String,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

/// Checks that the endpoint answers `/json/version` with 200 and returns the
/// reported version info.
pub async fn probe(endpoint: &RemoteEndpoint) -> Result<BrowserVersion> {
    let version_url = endpoint.version_url();
    debug!(test_url = %version_url, "Testing connection to remote Chrome instance");

    let client = reqwest::Client::builder()
        .timeout(REMOTE_PROBE_TIMEOUT)
        .build()
        .map_err(ToolboxError::browser)?;

    let response = client
        .get(&version_url)
        .send()
        .await
        .map_err(|source| ToolboxError::RemoteUnreachable {
            endpoint: endpoint.to_string(),
            port: endpoint.port().to_string(),
            source,
        })?;

    if response.status() != StatusCode::OK {
        return Err(ToolboxError::RemoteStatus {
            status: response.status(),
            url: version_url,
        });
    }

    let version = response.json::<BrowserVersion>().await.map_err(|e| {
        ToolboxError::browser(format!("unexpected payload from {version_url}: {e}"))
    })?;
    debug!(
        url = %endpoint.base_url(),
        browser = %version.browser,
        "Successfully connected to remote Chrome instance"
    );
    Ok(version)
}
