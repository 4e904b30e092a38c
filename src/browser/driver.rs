//! Seams between session orchestration and the remote-control protocol.
//!
//! The orchestration layer never talks CDP directly. It drives a
//! [`BrowserLauncher`] to obtain a [`BrowserConnection`] (the allocator), opens
//! one [`PageDriver`] (the task handle) on it, and consumes page events as a
//! stream of [`BrowserEvent`]s.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::Result;

/// Events emitted by a page that the event bridge reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    /// A `console.*` call. `args` holds each argument as raw JSON text
    /// (strings keep their surrounding quotes).
    ConsoleMessage { kind: String, args: Vec<String> },
    /// An uncaught exception in page script.
    Exception {
        text: String,
        frames: Vec<StackFrame>,
    },
    /// A native `alert`/`confirm`/`prompt`/`beforeunload` dialog was opened.
    DialogOpened { dialog_type: String, message: String },
}

/// One frame of a page exception's stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function_name: String,
    pub url: String,
    pub line: i64,
    pub column: i64,
}

/// Outcome of evaluating an expression in the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The expression completed; the value is returned by value.
    Value(serde_json::Value),
    /// The expression threw (or its promise rejected) with this error text.
    Thrown(String),
}

pub type EventStream = BoxStream<'static, BrowserEvent>;

/// A single controllable page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for the browser to acknowledge the navigation.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate `expression`; when `await_promise` is set the returned promise
    /// is awaited before the call completes.
    async fn evaluate(&self, expression: &str, await_promise: bool) -> Result<Evaluation>;

    /// Full-page raster capture with the given quality (0-100).
    async fn capture_screenshot(&self, quality: u8) -> Result<Vec<u8>>;

    /// Render the page to PDF with background graphics.
    async fn print_pdf(&self) -> Result<Vec<u8>>;

    /// Subscribe to console, exception and dialog events.
    async fn subscribe(&self) -> Result<EventStream>;

    /// Accept the currently open dialog.
    async fn accept_dialog(&self) -> Result<()>;

    /// Close the page.
    async fn close(&self) -> Result<()>;
}

/// A connection to a browser, local or remote.
#[async_trait]
pub trait BrowserConnection: Send + Sync {
    async fn open_page(&self) -> Result<Arc<dyn PageDriver>>;

    /// Release the connection. For a spawned browser this also stops the
    /// process; an attached browser keeps running.
    async fn close(&self) -> Result<()>;
}

/// Produces browser connections.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Spawn a fresh local headless browser.
    async fn launch(&self) -> Result<Arc<dyn BrowserConnection>>;

    /// Attach to an already running browser through its DevTools websocket.
    async fn attach(&self, websocket_url: &str) -> Result<Arc<dyn BrowserConnection>>;
}
