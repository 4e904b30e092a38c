//! chromiumoxide-backed implementation of the browser seams.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
    PrintToPdfParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    EvaluateParams, EventConsoleApiCalled, EventExceptionThrown, ExceptionDetails, RemoteObject,
};
use chromiumoxide::handler::Handler;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::instrument::WithSubscriber;

use super::driver::{
    BrowserConnection, BrowserEvent, BrowserLauncher, Evaluation, EventStream, PageDriver,
    StackFrame,
};
use crate::{Result, ToolboxError};

/// Launches headless Chrome or attaches over a DevTools websocket.
#[derive(Debug, Default, Clone)]
pub struct CdpLauncher;

#[async_trait]
impl BrowserLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserConnection>> {
        let config = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(ToolboxError::Launch)?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|err| ToolboxError::Launch(err.to_string()))?;
        Ok(Arc::new(CdpConnection::new(browser, handler, true)))
    }

    async fn attach(&self, websocket_url: &str) -> Result<Arc<dyn BrowserConnection>> {
        let (browser, handler) = Browser::connect(websocket_url)
            .await
            .map_err(|err| {
                ToolboxError::browser(format!("failed to attach to {websocket_url}: {err}"))
            })?;
        Ok(Arc::new(CdpConnection::new(browser, handler, false)))
    }
}

/// Drives the protocol handler for one browser connection.
struct CdpConnection {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    owns_process: bool,
}

impl CdpConnection {
    fn new(browser: Browser, mut handler: Handler, owns_process: bool) -> Self {
        let handler = tokio::spawn(
            async move {
                while let Some(event) = handler.next().await {
                    if let Err(err) = event {
                        debug!(error = %err, "CDP handler error");
                    }
                }
                debug!("CDP handler event loop ended");
            }
            .with_current_subscriber(),
        );
        Self {
            browser: Mutex::new(Some(browser)),
            handler,
            owns_process,
        }
    }
}

#[async_trait]
impl BrowserConnection for CdpConnection {
    async fn open_page(&self) -> Result<Arc<dyn PageDriver>> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(ToolboxError::SessionClosed {
            operation: "open page",
        })?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(ToolboxError::browser)?;
        Ok(Arc::new(CdpPage { page }))
    }

    async fn close(&self) -> Result<()> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) if self.owns_process => {
                let closed = browser.close().await.map(|_| ()).map_err(ToolboxError::browser);
                if let Err(err) = browser.wait().await {
                    debug!(error = %err, "Failed to reap Chrome process");
                }
                closed
            }
            // Attached browsers keep running; dropping the handle only ends the connection.
            _ => Ok(()),
        };
        self.handler.abort();
        result
    }
}

struct CdpPage {
    page: Page,
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(ToolboxError::browser)?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str, await_promise: bool) -> Result<Evaluation> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(await_promise)
            .return_by_value(true)
            .build()
            .map_err(ToolboxError::browser)?;
        let response = self
            .page
            .execute(params)
            .await
            .map_err(ToolboxError::browser)?;

        if let Some(details) = &response.result.exception_details {
            return Ok(Evaluation::Thrown(exception_text(details)));
        }
        Ok(Evaluation::Value(
            response
                .result
                .result
                .value
                .clone()
                .unwrap_or(serde_json::Value::Null),
        ))
    }

    async fn capture_screenshot(&self, quality: u8) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(i64::from(quality))
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(ToolboxError::browser)
    }

    async fn print_pdf(&self) -> Result<Vec<u8>> {
        let params = PrintToPdfParams {
            print_background: Some(true),
            ..Default::default()
        };
        self.page.pdf(params).await.map_err(ToolboxError::browser)
    }

    async fn subscribe(&self) -> Result<EventStream> {
        let console = self
            .page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(ToolboxError::browser)?
            .map(|event| BrowserEvent::ConsoleMessage {
                kind: enum_name(&event.r#type),
                args: event.args.iter().map(remote_object_text).collect(),
            })
            .boxed();

        let exceptions = self
            .page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(ToolboxError::browser)?
            .map(|event| {
                let details = &event.exception_details;
                BrowserEvent::Exception {
                    text: details.text.clone(),
                    frames: details
                        .stack_trace
                        .iter()
                        .flat_map(|trace| trace.call_frames.iter())
                        .map(|frame| StackFrame {
                            function_name: frame.function_name.clone(),
                            url: frame.url.clone(),
                            line: frame.line_number,
                            column: frame.column_number,
                        })
                        .collect(),
                }
            })
            .boxed();

        let dialogs = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(ToolboxError::browser)?
            .map(|event| BrowserEvent::DialogOpened {
                dialog_type: enum_name(&event.r#type),
                message: event.message.clone(),
            })
            .boxed();

        Ok(futures::stream::select_all([console, exceptions, dialogs]).boxed())
    }

    async fn accept_dialog(&self) -> Result<()> {
        self.page
            .execute(HandleJavaScriptDialogParams::new(true))
            .await
            .map_err(ToolboxError::browser)?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(ToolboxError::browser)
    }
}

/// Protocol enums serialize to their wire names (`log`, `alert`, ...).
fn enum_name<T: Serialize + Debug>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => format!("{value:?}").to_lowercase(),
    }
}

/// Raw JSON text for by-value objects, otherwise the protocol's description.
fn remote_object_text(object: &RemoteObject) -> String {
    if let Some(value) = &object.value {
        return value.to_string();
    }
    object
        .description
        .clone()
        .unwrap_or_else(|| enum_name(&object.r#type))
}

/// The thrown value's description carries the stack; fall back to the summary.
fn exception_text(details: &ExceptionDetails) -> String {
    details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.clone())
        .unwrap_or_else(|| details.text.clone())
}
