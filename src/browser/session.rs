//! Session establishment and lifecycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cdp::CdpLauncher;
use super::driver::{BrowserConnection, BrowserLauncher, PageDriver};
use super::remote::{self, RemoteEndpoint};
use super::script::InjectedScript;
use super::teardown::ReleaseStack;
use crate::{Result, ToolboxError};

/// Default session timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default blind delay after navigation.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Inputs for establishing a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Resolved target address (`file://…` or `http(s)://…`).
    pub target: String,
    /// Session deadline, measured from the start of establishment so browser
    /// start-up and the remote `/json/version` check count against it.
    pub timeout: Duration,
    /// Blind wait after navigation.
    pub delay: Duration,
    /// `host:port` of a running browser to attach to instead of spawning one.
    pub remote_endpoint: Option<String>,
    /// JavaScript to run once after the delay.
    pub script: Option<String>,
}

impl SessionOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            remote_endpoint: None,
            script: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SessionState {
    Unnavigated,
    Ready,
    Cancelled,
}

/// A live, cancelable browser page bound to one target.
///
/// Created by [`Session::establish`], advanced to ready by
/// [`Session::prepare`], and torn down by [`Session::cancel`]. Dropping a
/// session without cancelling it still releases its resources in the
/// background.
pub struct Session {
    pub(super) driver: Arc<dyn PageDriver>,
    pub(super) target: String,
    pub(super) delay: Duration,
    pub(super) script: Option<InjectedScript>,
    pub(super) deadline: Instant,
    pub(super) token: CancellationToken,
    pub(super) state: SessionState,
    pub(super) releases: ReleaseStack,
}

impl Session {
    /// Establish a session with the chromiumoxide backend.
    pub async fn establish(options: SessionOptions) -> Result<Session> {
        Self::establish_with(&CdpLauncher::default(), options).await
    }

    /// Establish a session, spawning a local browser or attaching to
    /// `options.remote_endpoint`.
    ///
    /// On error every resource acquired so far has already been released.
    pub async fn establish_with(
        launcher: &dyn BrowserLauncher,
        options: SessionOptions,
    ) -> Result<Session> {
        debug!(
            url = %options.target,
            timeout = options.timeout.as_secs(),
            delay = options.delay.as_secs(),
            remote_port = options.remote_endpoint.as_deref().unwrap_or(""),
            has_js_code = options.script.as_deref().is_some_and(|s| !s.is_empty()),
            "Initializing Chrome browser"
        );
        let deadline = Instant::now() + options.timeout;

        let connection = match options.remote_endpoint.as_deref() {
            Some(raw) => {
                let endpoint = RemoteEndpoint::parse(raw)?;
                let version = remote::probe(&endpoint).await?;
                let websocket_url = endpoint.websocket_url(&version)?;
                debug!(url = %websocket_url, "Attaching to remote Chrome instance");
                launcher.attach(&websocket_url).await?
            }
            None => {
                debug!("Creating new headless Chrome instance");
                launcher.launch().await?
            }
        };

        let mut releases = ReleaseStack::new();
        {
            let connection = Arc::clone(&connection);
            releases.push("browser connection", move || async move {
                if let Err(err) = connection.close().await {
                    warn!(error = %err, "Failed to close browser connection");
                }
            });
        }

        let page = match open_page(connection.as_ref(), deadline).await {
            Ok(page) => page,
            Err(err) => {
                releases.release_all().await;
                return Err(err);
            }
        };
        {
            let page = Arc::clone(&page);
            releases.push("page", move || async move {
                if let Err(err) = page.close().await {
                    warn!(error = %err, "Failed to close page");
                }
            });
        }

        debug!("Chrome context created successfully");
        Ok(Session {
            driver: page,
            target: options.target,
            delay: options.delay,
            script: options.script.and_then(InjectedScript::new),
            deadline,
            token: CancellationToken::new(),
            state: SessionState::Unnavigated,
            releases,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn script(&self) -> Option<&InjectedScript> {
        self.script.as_ref()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == SessionState::Cancelled
    }

    /// Cancel the session and release its page and connection.
    ///
    /// Safe to call after the deadline fired and safe to call repeatedly.
    pub async fn cancel(&mut self) {
        if self.state != SessionState::Cancelled {
            debug!(url = %self.target, "Cancelling browser session");
            self.state = SessionState::Cancelled;
            self.token.cancel();
        }
        self.releases.release_all().await;
    }

    pub(super) fn ensure_ready(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Unnavigated => Err(ToolboxError::NotPrepared { operation }),
            SessionState::Cancelled => Err(ToolboxError::SessionClosed { operation }),
        }
    }

    /// Run `fut` under the session deadline and cancellation.
    pub(super) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return Err(ToolboxError::SessionClosed { operation });
        }
        if Instant::now() >= self.deadline {
            return Err(ToolboxError::DeadlineExceeded { operation });
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ToolboxError::SessionClosed { operation }),
            res = tokio::time::timeout_at(self.deadline, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(ToolboxError::DeadlineExceeded { operation }),
            },
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .field("delay", &self.delay)
            .field("script", &self.script)
            .field("state", &self.state)
            .field("releases", &self.releases)
            .finish()
    }
}

async fn open_page(
    connection: &dyn BrowserConnection,
    deadline: Instant,
) -> Result<Arc<dyn PageDriver>> {
    match tokio::time::timeout_at(deadline, connection.open_page()).await {
        Ok(page) => page,
        Err(_) => Err(ToolboxError::DeadlineExceeded {
            operation: "open page",
        }),
    }
}
