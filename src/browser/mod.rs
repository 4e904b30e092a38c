//! Headless browser sessions over the Chrome DevTools Protocol.
//!
//! A [`Session`] owns one page in either a freshly spawned headless browser or
//! an already running one reached through its remote debugging port. The
//! lifecycle is fixed:
//!
//! 1. [`Session::establish`] acquires the browser connection and page.
//! 2. [`Session::attach_event_bridge`] (optional) forwards console output,
//!    uncaught exceptions and dialogs to the log.
//! 3. [`Session::prepare`] navigates, waits the rendering delay and runs the
//!    injected script.
//! 4. Actions ([`Session::screenshot`], [`Session::print_pdf`],
//!    [`Session::text_by_selector`], [`Session::body_text`]) run against the
//!    prepared page.
//! 5. [`Session::cancel`] releases everything in reverse acquisition order.
//!
//! Every step after establishment is bounded by the session deadline.
//!
//! # Module Structure
//!
//! - `driver` - protocol seams ([`PageDriver`]) and page events ([`BrowserEvent`])
//! - `cdp` - chromiumoxide implementation of the seams
//! - `remote` - remote debugging endpoint validation and liveness probe
//! - `session`, `pipeline`, `events`, `actions` - the lifecycle above
//!
//! # Example
//!
//! ```no_run
//! use toolbox_lib::browser::{Session, SessionOptions};
//!
//! # async fn example() -> toolbox_lib::Result<()> {
//! let mut session = Session::establish(SessionOptions::new("https://example.com")).await?;
//! session.prepare().await?;
//! let text = session.body_text().await;
//! session.cancel().await;
//! println!("{}", text?);
//! # Ok(())
//! # }
//! ```

mod actions;
mod cdp;
mod driver;
mod events;
mod pipeline;
mod remote;
mod script;
mod session;
mod teardown;
#[cfg(test)]
mod testing;

pub use actions::{ActionKind, SCREENSHOT_QUALITY};
pub use cdp::CdpLauncher;
pub use driver::{
    BrowserConnection, BrowserEvent, BrowserLauncher, Evaluation, EventStream, PageDriver,
    StackFrame,
};
pub use remote::{probe, BrowserVersion, RemoteEndpoint, REMOTE_PROBE_TIMEOUT};
pub use script::InjectedScript;
pub use session::{Session, SessionOptions, DEFAULT_DELAY, DEFAULT_TIMEOUT};
pub use teardown::ReleaseStack;

#[cfg(test)]
pub(crate) use testing::{FakeLauncher, Failure, FAKE_PDF, FAKE_SCREENSHOT};
