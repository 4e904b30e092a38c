//! Capture and extraction against a prepared session.

use std::fmt;

use serde_json::Value;
use tracing::{debug, error};

use super::driver::Evaluation;
use super::session::Session;
use crate::{Result, ToolboxError};

/// JPEG quality used for screenshots.
pub const SCREENSHOT_QUALITY: u8 = 90;

/// The fixed set of terminal actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Screenshot,
    Pdf,
    SelectorText,
    BodyText,
}

impl ActionKind {
    fn operation(self) -> &'static str {
        match self {
            ActionKind::Screenshot => "take screenshot",
            ActionKind::Pdf => "print to PDF",
            ActionKind::SelectorText => "get text by selector",
            ActionKind::BodyText => "get body text",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// Expression returning the trimmed, non-empty `innerText` of every element
/// matching `selector`, in document order.
pub(crate) fn selector_text_expression(selector: &str) -> String {
    let literal = Value::String(selector.to_string());
    format!(
        "Array.from(document.querySelectorAll({literal})).map(el => (el.innerText ?? el.textContent ?? '').trim()).filter(text => text.length > 0)"
    )
}

impl Session {
    /// Full-page JPEG screenshot.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let action = ActionKind::Screenshot;
        self.ensure_ready(action.operation())?;
        debug!("Taking screenshot");
        let buf = self
            .bounded(action.operation(), async {
                self.driver
                    .capture_screenshot(SCREENSHOT_QUALITY)
                    .await
                    .map_err(|err| ToolboxError::action(action, err))
            })
            .await
            .inspect_err(|err| error!(error = %err, "Failed to capture screenshot"))?;
        debug!(size = buf.len(), "Screenshot captured successfully");
        Ok(buf)
    }

    /// The page rendered as PDF, background graphics included.
    pub async fn print_pdf(&self) -> Result<Vec<u8>> {
        let action = ActionKind::Pdf;
        self.ensure_ready(action.operation())?;
        debug!("Generating PDF");
        let buf = self
            .bounded(action.operation(), async {
                self.driver
                    .print_pdf()
                    .await
                    .map_err(|err| ToolboxError::action(action, err))
            })
            .await
            .inspect_err(|err| error!(error = %err, "Failed to generate PDF"))?;
        debug!(size = buf.len(), "PDF generated successfully");
        Ok(buf)
    }

    /// Text of every element matching `selector`, one element per line.
    ///
    /// No match yields an empty string. An invalid selector is an error.
    pub async fn text_by_selector(&self, selector: &str) -> Result<String> {
        self.extract_text(ActionKind::SelectorText, selector).await
    }

    /// All visible text of `<body>`.
    pub async fn body_text(&self) -> Result<String> {
        self.extract_text(ActionKind::BodyText, "body").await
    }

    async fn extract_text(&self, action: ActionKind, selector: &str) -> Result<String> {
        self.ensure_ready(action.operation())?;
        debug!(selector, "Extracting text by CSS selector");

        let expression = selector_text_expression(selector);
        let texts = self
            .bounded(action.operation(), async {
                match self.driver.evaluate(&expression, false).await {
                    Ok(Evaluation::Value(value)) => serde_json::from_value::<Vec<String>>(value)
                        .map_err(|err| ToolboxError::action(action, err)),
                    Ok(Evaluation::Thrown(text)) => Err(ToolboxError::action(action, text)),
                    Err(err) => Err(ToolboxError::action(action, err)),
                }
            })
            .await
            .inspect_err(|err| {
                error!(selector, error = %err, "Failed to extract text by selector")
            })?;

        let result = texts.join("\n");
        debug!(
            selector,
            elements_found = texts.len(),
            total_text_length = result.len(),
            "Successfully extracted text"
        );
        Ok(result)
    }
}
