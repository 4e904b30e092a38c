//! Event bridge: page console output, exceptions and dialogs onto the log.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, warn};

use super::driver::{BrowserEvent, EventStream, PageDriver};
use super::session::{Session, SessionState};

impl Session {
    /// Start forwarding console messages, uncaught exceptions and dialogs to
    /// the log for the rest of the session.
    ///
    /// Call at most once, before [`Session::prepare`]; a second call registers
    /// a second set of listeners. Never fails the run: a subscription error is
    /// logged and capture is skipped.
    pub async fn attach_event_bridge(&mut self) {
        if self.state == SessionState::Cancelled {
            warn!("Session already closed; console capture skipped");
            return;
        }
        debug!("Setting up console log listeners");

        let driver = Arc::clone(&self.driver);
        let events = match self
            .bounded("subscribe to page events", driver.subscribe())
            .await
        {
            Ok(events) => events,
            Err(err) => {
                error!(error = %err, "Failed to set up console log listeners");
                return;
            }
        };

        let task = tokio::spawn(listen(events, driver, self.token.clone()).with_current_subscriber());
        self.releases.push("event listener", move || async move {
            task.abort();
            let _ = task.await;
        });
        debug!("Console log listeners set up successfully");
    }
}

async fn listen(mut events: EventStream, driver: Arc<dyn PageDriver>, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            next = events.next() => match next {
                Some(event) => dispatch(event, &driver),
                None => break,
            },
        }
    }
    debug!("Console log listener stopped");
}

/// React to one page event. Never blocks: dialog acceptance is detached.
pub(crate) fn dispatch(event: BrowserEvent, driver: &Arc<dyn PageDriver>) {
    match event {
        BrowserEvent::ConsoleMessage { kind, args } => {
            info!(
                kind = %kind,
                value = %join_console_args(&args),
                "Console message captured"
            );
        }
        BrowserEvent::Exception { text, frames } => {
            error!(text = %text, "JavaScript exception captured");
            for frame in frames {
                debug!(
                    function = %frame.function_name,
                    url = %frame.url,
                    line = frame.line,
                    column = frame.column,
                    "Stack trace frame"
                );
            }
        }
        BrowserEvent::DialogOpened {
            dialog_type,
            message,
        } => {
            debug!(
                dialog_type = %dialog_type,
                message = %message,
                "JavaScript dialog detected, handling automatically"
            );
            spawn_dialog_accept(Arc::clone(driver));
        }
    }
}

/// Accept the open dialog on a detached task. The main flow never awaits it;
/// a failure is only logged.
fn spawn_dialog_accept(driver: Arc<dyn PageDriver>) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            if let Err(err) = driver.accept_dialog().await {
                error!(error = %err, "Failed to handle JavaScript dialog");
            }
        }
        .with_current_subscriber(),
    )
}

/// Join console arguments with single spaces, dropping the quotes around
/// JSON string values. Escapes inside the string are left as-is.
pub(crate) fn join_console_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"') {
                &arg[1..arg.len() - 1]
            } else {
                arg.as_str()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
