//! One capture run: validate options, drive a session through the requested
//! actions, persist artifacts.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::{BrowserLauncher, RemoteEndpoint, Session, SessionOptions};
use crate::config::{effective_timeout, LARGE_DELAY};
use crate::output::{ArtifactKind, ArtifactWriter};
use crate::target::{resolve_target, ResolvedTarget};
use crate::{Result, ToolboxError};

/// Which actions a run performs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub console_log: bool,
    pub screenshot: bool,
    pub pdf: bool,
    pub body: bool,
    pub selector: Option<String>,
}

impl ActionSet {
    pub fn is_empty(&self) -> bool {
        !self.console_log && !self.screenshot && !self.pdf && !self.body && self.selector.is_none()
    }
}

/// Unvalidated run inputs, merged from flags and the config file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target: String,
    pub timeout: Duration,
    /// Seconds; kept signed so a negative value can be reported.
    pub delay_secs: i64,
    pub remote_endpoint: Option<String>,
    pub js: Option<String>,
    pub js_file: Option<PathBuf>,
    pub actions: ActionSet,
    pub output_dir: PathBuf,
}

/// Validated inputs for [`run`].
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub target: ResolvedTarget,
    pub session: SessionOptions,
    pub actions: ActionSet,
    pub output_dir: PathBuf,
}

impl RunOptions {
    pub fn validate(self) -> Result<RunPlan> {
        if self.target.trim().is_empty() {
            return Err(ToolboxError::config(
                "target must not be empty; pass a URL or local HTML file",
            ));
        }
        if self.delay_secs < 0 {
            return Err(ToolboxError::config(format!(
                "delay cannot be negative: {}",
                self.delay_secs
            )));
        }
        if self.actions.is_empty() {
            return Err(ToolboxError::config(
                "at least one action must be specified (-c, -s, -p, -b, or -g)",
            ));
        }
        if self.js.is_some() && self.js_file.is_some() {
            return Err(ToolboxError::config(
                "--js and --js-file are mutually exclusive",
            ));
        }
        if let Some(endpoint) = &self.remote_endpoint {
            RemoteEndpoint::parse(endpoint)?;
        }

        let target = resolve_target(&self.target)?;
        let script = match (self.js, &self.js_file) {
            (Some(code), _) => Some(code),
            (None, Some(path)) => {
                debug!(path = %path.display(), "Reading JavaScript from file");
                Some(std::fs::read_to_string(path)?)
            }
            (None, None) => None,
        };

        let delay = Duration::from_secs(self.delay_secs.unsigned_abs());
        if delay > LARGE_DELAY {
            warn!(delay = delay.as_secs(), "Large delay specified, this may cause long wait times");
        }
        let timeout = effective_timeout(self.timeout, delay);
        if timeout != self.timeout {
            info!(
                original_timeout = self.timeout.as_secs(),
                delay = delay.as_secs(),
                adjusted_timeout = timeout.as_secs(),
                "Adjusted timeout to accommodate delay"
            );
        }

        let session = SessionOptions {
            target: target.url.clone(),
            timeout,
            delay,
            remote_endpoint: self.remote_endpoint,
            script,
        };
        Ok(RunPlan {
            target,
            session,
            actions: self.actions,
            output_dir: self.output_dir,
        })
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub selector_text: Option<String>,
    pub body_text: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
}

/// Execute `plan`, writing text results and "saved as" lines to `out`.
///
/// Stops at the first failing step. The session is always cancelled before
/// returning.
pub async fn run(
    plan: &RunPlan,
    launcher: &dyn BrowserLauncher,
    out: &mut dyn Write,
) -> Result<RunReport> {
    debug!(
        url = %plan.session.target,
        timeout = plan.session.timeout.as_secs(),
        delay = plan.session.delay.as_secs(),
        "Starting capture run"
    );
    let mut session = Session::establish_with(launcher, plan.session.clone()).await?;
    let result = drive(&mut session, plan, out).await;
    session.cancel().await;
    result
}

async fn drive(session: &mut Session, plan: &RunPlan, out: &mut dyn Write) -> Result<RunReport> {
    let actions = &plan.actions;
    let writer = ArtifactWriter::new(&plan.output_dir);
    let mut report = RunReport::default();

    if actions.console_log {
        session.attach_event_bridge().await;
    }
    session.prepare().await?;

    if let Some(selector) = &actions.selector {
        let text = session.text_by_selector(selector).await?;
        writeln!(out, "{text}")?;
        report.selector_text = Some(text);
    }
    if actions.body {
        let text = session.body_text().await?;
        writeln!(out, "{text}")?;
        report.body_text = Some(text);
    }
    if actions.screenshot {
        let bytes = session.screenshot().await?;
        let path = writer.write(ArtifactKind::Screenshot, &bytes)?;
        writeln!(out, "Screenshot saved as {}", path.display())?;
        report.screenshot = Some(path);
    }
    if actions.pdf {
        let bytes = session.print_pdf().await?;
        let path = writer.write(ArtifactKind::Pdf, &bytes)?;
        writeln!(out, "PDF saved as {}", path.display())?;
        report.pdf = Some(path);
    }
    if actions.console_log {
        info!("Console log capture completed");
    }
    Ok(report)
}
