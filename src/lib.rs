//! that-cli-web-toolbox library
//!
//! Loads one web page (remote URL or local HTML file) in headless Chrome and
//! extracts artifacts from it: a full-page screenshot, a PDF rendering, the
//! text of elements matching a CSS selector, the page body text, and a live
//! log of the page's console output.
//!
//! # Module Overview
//!
//! - [`browser`] - Session lifecycle over the Chrome DevTools Protocol
//! - [`capture`] - Validated run options and the action runner
//! - [`config`] - Configuration file support and timeout rules
//! - [`target`] - Turning user input into a navigable address
//! - [`output`] - Artifact file naming and persistence
//!
//! # Example
//!
//! ```no_run
//! use toolbox_lib::{run, ActionSet, CdpLauncher, RunOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> toolbox_lib::Result<()> {
//! let plan = RunOptions {
//!     target: "https://example.com".to_string(),
//!     timeout: Duration::from_secs(10),
//!     delay_secs: 2,
//!     remote_endpoint: None,
//!     js: None,
//!     js_file: None,
//!     actions: ActionSet { body: true, ..ActionSet::default() },
//!     output_dir: ".".into(),
//! }
//! .validate()?;
//! run(&plan, &CdpLauncher::default(), &mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod target;

pub use browser::{
    ActionKind, BrowserEvent, BrowserLauncher, CdpLauncher, PageDriver, RemoteEndpoint, Session,
    SessionOptions, DEFAULT_DELAY, DEFAULT_TIMEOUT,
};
pub use capture::{run, ActionSet, RunOptions, RunPlan, RunReport};
pub use config::{effective_timeout, Config, DELAY_MARGIN};
pub use error::{ErrorCategory, ErrorPayload, Result, ToolboxError};
pub use output::{ArtifactKind, ArtifactWriter};
pub use target::{resolve_target, ResolvedTarget, TargetKind, TargetParseError};
