//! Instrumented fakes for the browser seams.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use super::driver::{
    BrowserConnection, BrowserEvent, BrowserLauncher, Evaluation, EventStream, PageDriver,
};
use crate::{Result, ToolboxError};

pub(crate) const FAKE_SCREENSHOT: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";
pub(crate) const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Launch,
    Attach,
    OpenPage,
}

/// Tracks which acquired resources are still open.
#[derive(Debug, Default)]
struct Ledger {
    open: usize,
    release_order: Vec<&'static str>,
}

type Evaluator = Box<dyn Fn(&str, bool) -> Result<Evaluation> + Send + Sync>;

pub(crate) struct FakePage {
    ledger: Arc<Mutex<Ledger>>,
    calls: Mutex<Vec<(String, Instant)>>,
    navigate_error: Mutex<Option<String>>,
    hang_on_navigate: Mutex<bool>,
    evaluator: Mutex<Evaluator>,
    events_tx: mpsc::UnboundedSender<BrowserEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<BrowserEvent>>>,
    dialog_gate: Mutex<Option<Arc<Notify>>>,
    dialog_accepted: Notify,
    fail_dialogs: Mutex<bool>,
}

impl FakePage {
    fn with_ledger(ledger: Arc<Mutex<Ledger>>) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            ledger,
            calls: Mutex::new(Vec::new()),
            navigate_error: Mutex::new(None),
            hang_on_navigate: Mutex::new(false),
            evaluator: Mutex::new(Box::new(|_, _| Ok(Evaluation::Value(json!([]))))),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            dialog_gate: Mutex::new(None),
            dialog_accepted: Notify::new(),
            fail_dialogs: Mutex::new(false),
        })
    }

    fn record(&self, call: impl Into<String>) {
        self.calls
            .lock()
            .unwrap()
            .push((call.into(), Instant::now()));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn call_time(&self, prefix: &str) -> Option<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name.starts_with(prefix))
            .map(|(_, at)| *at)
    }

    pub(crate) fn fail_navigation(&self, message: &str) {
        *self.navigate_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn hang_on_navigate(&self) {
        *self.hang_on_navigate.lock().unwrap() = true;
    }

    pub(crate) fn set_evaluator<F>(&self, evaluator: F)
    where
        F: Fn(&str, bool) -> Result<Evaluation> + Send + Sync + 'static,
    {
        *self.evaluator.lock().unwrap() = Box::new(evaluator);
    }

    pub(crate) fn emit(&self, event: BrowserEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Make `accept_dialog` wait until the returned gate is notified.
    pub(crate) fn hold_dialogs(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.dialog_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn fail_dialogs(&self) {
        *self.fail_dialogs.lock().unwrap() = true;
    }

    pub(crate) async fn dialog_accepted(&self) {
        self.dialog_accepted.notified().await;
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{url}"));
        let hang = *self.hang_on_navigate.lock().unwrap();
        if hang {
            futures::future::pending::<()>().await;
        }
        let error = self.navigate_error.lock().unwrap().clone();
        match error {
            Some(message) => Err(ToolboxError::browser(message)),
            None => Ok(()),
        }
    }

    async fn evaluate(&self, expression: &str, await_promise: bool) -> Result<Evaluation> {
        self.record(format!("evaluate:{expression}|await={await_promise}"));
        let evaluator = self.evaluator.lock().unwrap();
        (*evaluator)(expression, await_promise)
    }

    async fn capture_screenshot(&self, quality: u8) -> Result<Vec<u8>> {
        self.record(format!("screenshot:{quality}"));
        Ok(FAKE_SCREENSHOT.to_vec())
    }

    async fn print_pdf(&self) -> Result<Vec<u8>> {
        self.record("pdf");
        Ok(FAKE_PDF.to_vec())
    }

    async fn subscribe(&self) -> Result<EventStream> {
        self.record("subscribe");
        let rx = self
            .events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ToolboxError::browser("already subscribed"))?;
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }

    async fn accept_dialog(&self) -> Result<()> {
        let gate = self.dialog_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.record("accept_dialog");
        let failed = *self.fail_dialogs.lock().unwrap();
        self.dialog_accepted.notify_one();
        if failed {
            return Err(ToolboxError::browser("no dialog is showing"));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        let mut ledger = self.ledger.lock().unwrap();
        ledger.open = ledger.open.saturating_sub(1);
        ledger.release_order.push("page");
        Ok(())
    }
}

struct FakeConnection {
    ledger: Arc<Mutex<Ledger>>,
    page: Arc<FakePage>,
    fail_page: bool,
}

#[async_trait]
impl BrowserConnection for FakeConnection {
    async fn open_page(&self) -> Result<Arc<dyn PageDriver>> {
        if self.fail_page {
            return Err(ToolboxError::browser("target creation failed"));
        }
        self.ledger.lock().unwrap().open += 1;
        Ok(Arc::clone(&self.page) as Arc<dyn PageDriver>)
    }

    async fn close(&self) -> Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.open = ledger.open.saturating_sub(1);
        ledger.release_order.push("connection");
        Ok(())
    }
}

#[derive(Default)]
struct LaunchCounts {
    launches: usize,
    attached: Vec<String>,
}

/// Launcher that hands out [`FakePage`]s and records every acquisition and
/// release.
pub(crate) struct FakeLauncher {
    ledger: Arc<Mutex<Ledger>>,
    counts: Mutex<LaunchCounts>,
    page: Arc<FakePage>,
    failure: Option<Failure>,
    launch_latency: Duration,
}

impl FakeLauncher {
    pub(crate) fn new() -> Self {
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        Self {
            page: FakePage::with_ledger(Arc::clone(&ledger)),
            ledger,
            counts: Mutex::new(LaunchCounts::default()),
            failure: None,
            launch_latency: Duration::ZERO,
        }
    }

    /// Make `launch` take `latency` before handing out a connection.
    pub(crate) fn with_launch_latency(mut self, latency: Duration) -> Self {
        self.launch_latency = latency;
        self
    }

    pub(crate) fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub(crate) fn page(&self) -> &Arc<FakePage> {
        &self.page
    }

    pub(crate) fn launches(&self) -> usize {
        self.counts.lock().unwrap().launches
    }

    pub(crate) fn attaches(&self) -> usize {
        self.counts.lock().unwrap().attached.len()
    }

    pub(crate) fn attached_urls(&self) -> Vec<String> {
        self.counts.lock().unwrap().attached.clone()
    }

    pub(crate) fn open_resources(&self) -> usize {
        self.ledger.lock().unwrap().open
    }

    pub(crate) fn release_order(&self) -> Vec<&'static str> {
        self.ledger.lock().unwrap().release_order.clone()
    }

    fn connect(&self) -> Arc<dyn BrowserConnection> {
        self.ledger.lock().unwrap().open += 1;
        Arc::new(FakeConnection {
            ledger: Arc::clone(&self.ledger),
            page: Arc::clone(&self.page),
            fail_page: self.failure == Some(Failure::OpenPage),
        })
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserConnection>> {
        self.counts.lock().unwrap().launches += 1;
        if !self.launch_latency.is_zero() {
            tokio::time::sleep(self.launch_latency).await;
        }
        if self.failure == Some(Failure::Launch) {
            return Err(ToolboxError::Launch("chrome not found".to_string()));
        }
        Ok(self.connect())
    }

    async fn attach(&self, websocket_url: &str) -> Result<Arc<dyn BrowserConnection>> {
        self.counts
            .lock()
            .unwrap()
            .attached
            .push(websocket_url.to_string());
        if self.failure == Some(Failure::Attach) {
            return Err(ToolboxError::browser("websocket handshake failed"));
        }
        Ok(self.connect())
    }
}

/// Serves one canned HTTP response per connection; returns the bound
/// `127.0.0.1:port`.
pub(crate) async fn serve_http(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("127.0.0.1:{}", addr.port())
}
