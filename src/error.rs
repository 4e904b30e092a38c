use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

use crate::browser::ActionKind;

#[derive(Debug, Error)]
pub enum ToolboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid remote debugging port format: {value} (expected format: {expected})")]
    InvalidRemoteEndpoint {
        value: String,
        expected: &'static str,
    },

    #[error("failed to connect to remote debugging port {endpoint}: {source} (ensure Chrome is running with --remote-debugging-port={port})")]
    RemoteUnreachable {
        endpoint: String,
        port: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("remote debugging endpoint returned status {status} at {url} (ensure Chrome is running with remote debugging enabled)")]
    RemoteStatus { status: StatusCode, url: String },

    #[error("Failed to start browser: {0}")]
    Launch(String),

    #[error("Browser protocol error: {0}")]
    Browser(String),

    #[error("failed to navigate to {target}: {message}")]
    Navigation { target: String, message: String },

    #[error("JavaScript exception: {0}")]
    Script(String),

    #[error("failed to {action}: {message}")]
    Action { action: ActionKind, message: String },

    #[error("{operation} did not finish before the session deadline")]
    DeadlineExceeded { operation: &'static str },

    #[error("browser session is closed; {operation} cannot run")]
    SessionClosed { operation: &'static str },

    #[error("page has not been navigated yet; {operation} requires a prepared session")]
    NotPrepared { operation: &'static str },

    #[error("page was already navigated; a session is prepared only once")]
    AlreadyPrepared,
}

impl ToolboxError {
    pub fn config(message: impl Into<String>) -> Self {
        ToolboxError::Config(message.into())
    }

    pub fn browser(message: impl ToString) -> Self {
        ToolboxError::Browser(message.to_string())
    }

    pub fn navigation(target: &str, message: impl ToString) -> Self {
        ToolboxError::Navigation {
            target: target.to_string(),
            message: message.to_string(),
        }
    }

    pub fn action(action: ActionKind, message: impl ToString) -> Self {
        ToolboxError::Action {
            action,
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolboxError::Io(_) => ErrorCategory::Io,
            ToolboxError::InvalidUrl(_)
            | ToolboxError::Config(_)
            | ToolboxError::ConfigParse(_)
            | ToolboxError::InvalidRemoteEndpoint { .. } => ErrorCategory::Config,
            ToolboxError::RemoteUnreachable { .. } | ToolboxError::RemoteStatus { .. } => {
                ErrorCategory::Connection
            }
            ToolboxError::Launch(_) | ToolboxError::Browser(_) => ErrorCategory::Browser,
            ToolboxError::Navigation { .. } => ErrorCategory::Navigation,
            ToolboxError::Script(_) => ErrorCategory::Script,
            ToolboxError::Action { .. } => ErrorCategory::Action,
            ToolboxError::DeadlineExceeded { .. } => ErrorCategory::Timeout,
            ToolboxError::SessionClosed { .. }
            | ToolboxError::NotPrepared { .. }
            | ToolboxError::AlreadyPrepared => ErrorCategory::Unknown,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let remediation = match self {
            ToolboxError::Io(_) => "Check the output directory exists and is writable.",
            ToolboxError::InvalidUrl(_) => {
                "Verify the target (e.g., https://example.com or ./page.html)."
            }
            ToolboxError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("delay") {
                    "Pass a non-negative --delay in seconds (e.g., --delay 2)."
                } else if lower.contains("action") {
                    "Pass at least one of --body, --screenshot, --printtopdf, --consolelog or --gettextbycssselector."
                } else if lower.contains("--js") {
                    "Use either --js or --js-file, not both."
                } else if lower.contains("target") {
                    "Pass a URL or the path of a local HTML file as the last argument."
                } else {
                    "Check flags and the config file (see --help)."
                }
            }
            ToolboxError::ConfigParse(_) => {
                "Fix the TOML syntax; durations are strings such as \"10s\"."
            }
            ToolboxError::InvalidRemoteEndpoint { .. } => {
                "Use host:port for --remote-debugging-port (e.g., localhost:9222)."
            }
            ToolboxError::RemoteUnreachable { .. } | ToolboxError::RemoteStatus { .. } => {
                "Start Chrome with --remote-debugging-port=<port> and verify http://<host:port>/json/version responds."
            }
            ToolboxError::Launch(_) => {
                "Ensure google-chrome or chromium is installed and available on PATH, or attach with --remote-debugging-port."
            }
            ToolboxError::Browser(_) => "Rerun with --loglevel debug to inspect the browser session.",
            ToolboxError::Navigation { .. } => {
                "Check the URL is reachable (DNS, network) or the local file exists."
            }
            ToolboxError::Script(_) => "Fix the JavaScript passed via --js/--js-file.",
            ToolboxError::Action { .. } => {
                "Check the selector syntax or rerun with a longer --delay for dynamic pages."
            }
            ToolboxError::DeadlineExceeded { .. } => {
                "Increase --timeout (or lower --delay) so the page can finish."
            }
            ToolboxError::SessionClosed { .. }
            | ToolboxError::NotPrepared { .. }
            | ToolboxError::AlreadyPrepared => {
                "Rerun with --loglevel debug; file an issue if persistent."
            }
        };
        ErrorPayload::new(self.category(), self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, ToolboxError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Connection,
    Browser,
    Navigation,
    Script,
    Action,
    Timeout,
    Io,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
