//! Navigate → delay → inject script.

use tracing::{debug, error};

use super::driver::Evaluation;
use super::session::{Session, SessionState};
use crate::{Result, ToolboxError};

impl Session {
    /// Navigate to the target, wait the blind delay, then run the injected
    /// script (if any).
    ///
    /// Must run exactly once, after the event bridge is attached (when console
    /// capture is wanted) and before any action. The delay is unconditional:
    /// load events are not trusted for script-heavy pages.
    pub async fn prepare(&mut self) -> Result<()> {
        match self.state {
            SessionState::Unnavigated => {}
            SessionState::Ready => return Err(ToolboxError::AlreadyPrepared),
            SessionState::Cancelled => {
                return Err(ToolboxError::SessionClosed {
                    operation: "navigate",
                })
            }
        }

        self.navigate().await?;
        self.wait_delay().await?;
        self.inject_script().await?;

        self.state = SessionState::Ready;
        debug!("Navigation and preparation completed successfully");
        Ok(())
    }

    async fn navigate(&self) -> Result<()> {
        debug!(url = %self.target, "Navigating to target URL");
        let target = self.target.as_str();
        let result = self
            .bounded("navigate", async {
                self.driver
                    .navigate(target)
                    .await
                    .map_err(|err| ToolboxError::navigation(target, err))
            })
            .await;
        if let Err(err) = &result {
            error!(url = %target, error = %err, "Failed to navigate and prepare page");
        }
        result
    }

    async fn wait_delay(&self) -> Result<()> {
        debug!(delay = self.delay.as_secs(), url = %self.target, "Applying rendering delay");
        let delay = self.delay;
        self.bounded("rendering delay", async move {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }

    async fn inject_script(&self) -> Result<()> {
        let Some(script) = &self.script else {
            return Ok(());
        };
        let is_async = script.is_async();
        debug!(
            code_length = script.source().len(),
            has_await = is_async,
            "Executing custom JavaScript"
        );

        let expression = script.expression();
        let evaluation = self
            .bounded("evaluate custom JavaScript", async {
                self.driver.evaluate(&expression, is_async).await
            })
            .await
            .map_err(|err| match err {
                ToolboxError::Browser(message) => ToolboxError::Script(message),
                other => other,
            });

        match evaluation {
            Ok(Evaluation::Value(_)) => {
                debug!("Custom JavaScript executed successfully");
                Ok(())
            }
            Ok(Evaluation::Thrown(text)) => {
                error!(exception = %text, "JavaScript exception during execution");
                Err(ToolboxError::Script(text))
            }
            Err(err) => {
                error!(error = %err, "Failed to execute custom JavaScript");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::browser::testing::FakeLauncher;
    use crate::browser::SessionOptions;

    async fn session_with(launcher: &FakeLauncher, script: Option<&str>) -> Session {
        let mut options = SessionOptions::new("file:///tmp/index.html");
        options.delay = Duration::from_secs(2);
        options.timeout = Duration::from_secs(12);
        options.script = script.map(str::to_string);
        Session::establish_with(launcher, options).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn navigate_then_delay_then_script() {
        let launcher = FakeLauncher::new();
        let mut session = session_with(&launcher, Some("document.title = 'x';")).await;

        session.prepare().await.unwrap();

        let page = launcher.page();
        assert_eq!(
            page.calls(),
            vec![
                "navigate:file:///tmp/index.html".to_string(),
                "evaluate:document.title = 'x';|await=false".to_string(),
            ]
        );
        let navigated = page.call_time("navigate").unwrap();
        let evaluated = page.call_time("evaluate").unwrap();
        assert!(evaluated - navigated >= Duration::from_secs(2));
        assert!(session.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn async_script_is_wrapped_and_awaited() {
        let launcher = FakeLauncher::new();
        let mut session =
            session_with(&launcher, Some("await new Promise(r => setTimeout(r, 50));")).await;

        session.prepare().await.unwrap();

        assert!(launcher.page().calls().contains(
            &"evaluate:(async () => { await new Promise(r => setTimeout(r, 50)); })();|await=true"
                .to_string()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_script_still_waits_the_delay() {
        let launcher = FakeLauncher::new();
        let mut session = session_with(&launcher, None).await;
        let start = tokio::time::Instant::now();

        session.prepare().await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(
            launcher.page().calls(),
            vec!["navigate:file:///tmp/index.html".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_failure_names_target_and_skips_script() {
        let launcher = FakeLauncher::new();
        launcher.page().fail_navigation("net::ERR_FILE_NOT_FOUND");
        let mut session = session_with(&launcher, Some("x = 1")).await;

        let err = session.prepare().await.unwrap_err();

        match err {
            ToolboxError::Navigation { target, message } => {
                assert_eq!(target, "file:///tmp/index.html");
                assert!(message.contains("ERR_FILE_NOT_FOUND"));
            }
            other => panic!("expected navigation error, got {other:?}"),
        }
        assert_eq!(launcher.page().calls().len(), 1);
        assert!(!session.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn thrown_script_error_is_preserved_verbatim() {
        let launcher = FakeLauncher::new();
        launcher
            .page()
            .set_evaluator(|_, _| Ok(Evaluation::Thrown("Error: boom at <anonymous>:1:7".into())));
        let mut session = session_with(&launcher, Some("throw new Error('boom')")).await;

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(err, ToolboxError::Script(ref text) if text == "Error: boom at <anonymous>:1:7"));
        assert_eq!(err.to_string(), "JavaScript exception: Error: boom at <anonymous>:1:7");
    }

    #[tokio::test(start_paused = true)]
    async fn protocol_failure_during_script_is_a_script_error() {
        let launcher = FakeLauncher::new();
        launcher
            .page()
            .set_evaluator(|_, _| Err(ToolboxError::browser("Execution context was destroyed")));
        let mut session = session_with(&launcher, Some("location.reload()")).await;

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(err, ToolboxError::Script(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_navigation_hits_the_deadline() {
        let launcher = FakeLauncher::new();
        launcher.page().hang_on_navigate();
        let mut session = session_with(&launcher, None).await;

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(err, ToolboxError::DeadlineExceeded { operation: "navigate" }));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_longer_than_timeout_hits_the_deadline() {
        let launcher = FakeLauncher::new();
        let mut options = SessionOptions::new("https://example.com");
        options.delay = Duration::from_secs(30);
        options.timeout = Duration::from_secs(5);
        let mut session = Session::establish_with(&launcher, options).await.unwrap();

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(
            err,
            ToolboxError::DeadlineExceeded {
                operation: "rendering delay"
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn second_prepare_is_rejected() {
        let launcher = FakeLauncher::new();
        let mut session = session_with(&launcher, None).await;
        session.prepare().await.unwrap();

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(err, ToolboxError::AlreadyPrepared));
        assert_eq!(launcher.page().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prepare_after_cancel_fails() {
        let launcher = FakeLauncher::new();
        let mut session = session_with(&launcher, None).await;
        session.cancel().await;

        let err = session.prepare().await.unwrap_err();

        assert!(matches!(err, ToolboxError::SessionClosed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn script_result_value_is_ignored() {
        let launcher = FakeLauncher::new();
        launcher
            .page()
            .set_evaluator(|_, _| Ok(Evaluation::Value(json!({"ok": true}))));
        let mut session = session_with(&launcher, Some("({ok: true})")).await;

        session.prepare().await.unwrap();
    }
}
