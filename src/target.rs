use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::ToolboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    LocalFile,
    Url,
}

/// A target ready to hand to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub kind: TargetKind,
    /// What the user typed.
    pub input: String,
    /// `file://` or `http(s)://` address.
    pub url: String,
}

#[derive(Debug, Error)]
pub enum TargetParseError {
    #[error("target must not be empty; pass a URL or the path of a local HTML file")]
    Empty,
    #[error("cannot resolve local file '{path}': {source}")]
    UnresolvablePath {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid target URL '{value}': {message}")]
    InvalidUrl { value: String, message: String },
}

impl From<TargetParseError> for ToolboxError {
    fn from(err: TargetParseError) -> Self {
        ToolboxError::Config(err.to_string())
    }
}

/// Turn user input into a navigable address.
///
/// An existing filesystem path wins over URL interpretation. Inputs that
/// already carry a scheme pass through unchanged; bare hosts get `https://`.
pub fn resolve_target(input: &str) -> Result<ResolvedTarget, TargetParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TargetParseError::Empty);
    }

    let path = Path::new(trimmed);
    if path.exists() {
        return resolve_local(trimmed, path);
    }

    let url = if trimmed.contains("://") {
        debug!(target_url = %trimmed, "Detected URL target");
        trimmed.to_string()
    } else {
        let prefixed = format!("https://{trimmed}");
        warn!(
            input = %trimmed,
            url = %prefixed,
            "Target is neither an existing file nor a URL with a scheme; assuming https"
        );
        prefixed
    };
    Url::parse(&url).map_err(|e| TargetParseError::InvalidUrl {
        value: trimmed.to_string(),
        message: e.to_string(),
    })?;

    Ok(ResolvedTarget {
        kind: TargetKind::Url,
        input: input.to_string(),
        url,
    })
}

fn resolve_local(input: &str, path: &Path) -> Result<ResolvedTarget, TargetParseError> {
    let absolute =
        std::fs::canonicalize(path).map_err(|source| TargetParseError::UnresolvablePath {
            path: input.to_string(),
            source,
        })?;
    let url = Url::from_file_path(&absolute).map_err(|()| TargetParseError::InvalidUrl {
        value: input.to_string(),
        message: "path cannot be expressed as a file:// URL".to_string(),
    })?;
    debug!(path = %absolute.display(), url = %url, "Detected local file target");
    Ok(ResolvedTarget {
        kind: TargetKind::LocalFile,
        input: input.to_string(),
        url: url.to_string(),
    })
}
