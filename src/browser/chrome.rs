//! Chromium backend built on `chromiumoxide`

use super::{BrowserEngine, BrowserError, BrowserHandle, InterceptPolicy, PageHandle};
use crate::config::Config;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams, EventAuthRequired, EventRequestPaused,
    FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventResponseReceived, ResourceType,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Switches passed to every launched browser
const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-setuid-sandbox",
    "--no-first-run",
    "--no-zygote",
    "--disable-extensions",
    "--disable-background-networking",
];

/// How long to keep listening for the main document response after `goto`
const STATUS_CAPTURE_WINDOW: Duration = Duration::from_secs(2);

/// Poll interval used by `wait_for_selector`
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches headless Chromium instances
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    config: Arc<Config>,
}

impl ChromeEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// Command line for one browser: fixed switches, proxy, then configured extras
fn launch_args(proxy: Option<&str>, extra_args: &[String]) -> Vec<String> {
    let mut args: Vec<String> = LAUNCH_ARGS.iter().map(|a| a.to_string()).collect();
    if let Some(proxy) = proxy {
        args.push(format!("--proxy-server={}", proxy));
    }
    args.extend(extra_args.iter().cloned());
    args
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    type Browser = ChromeBrowser;

    async fn launch(&self, proxy: Option<&str>) -> Result<ChromeBrowser, BrowserError> {
        let settings = &self.config.browser;

        let mut builder = LaunchConfig::builder()
            .no_sandbox()
            .request_timeout(settings.default_timeout())
            .args(launch_args(proxy, &settings.extra_args));

        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }

        let launch_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let handler_alive = Arc::clone(&alive);
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("DevTools handler error: {}", e);
                }
            }
            handler_alive.store(false, Ordering::SeqCst);
        });

        tracing::debug!(
            "Browser launched{}",
            proxy.map(|p| format!(" via proxy {}", p)).unwrap_or_default()
        );

        Ok(ChromeBrowser {
            browser,
            handler_task,
            alive,
            closed: false,
        })
    }
}

/// A running Chromium process and its DevTools event loop
pub struct ChromeBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    closed: bool,
}

#[async_trait]
impl BrowserHandle for ChromeBrowser {
    type Page = ChromePage;

    async fn new_page(&self) -> Result<ChromePage, BrowserError> {
        if self.closed || !self.alive.load(Ordering::SeqCst) {
            return Err(BrowserError::Connection(
                "browser event loop has stopped".to_string(),
            ));
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(map_cdp_error)?;

        Ok(ChromePage {
            page,
            default_timeout: Duration::from_secs(30),
            tasks: Vec::new(),
        })
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await.map(|_| ()).map_err(map_cdp_error);
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process wait failed: {}", e);
        }
        self.handler_task.abort();

        result
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// A Chromium tab plus the background tasks serving its interception
pub struct ChromePage {
    page: Page,
    default_timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl ChromePage {
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, BrowserError>
    where
        F: std::future::Future<Output = Result<T, CdpError>>,
    {
        match tokio::time::timeout(self.default_timeout, fut).await {
            Ok(result) => result.map_err(map_cdp_error),
            Err(_) => Err(BrowserError::timeout(operation, self.default_timeout)),
        }
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    fn set_default_timeout(&mut self, timeout: Duration) {
        self.default_timeout = timeout;
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<(), BrowserError> {
        self.bounded("set user agent", async {
            self.page.set_user_agent(user_agent).await.map(|_| ())
        })
        .await
    }

    async fn intercept_requests(&mut self, policy: InterceptPolicy) -> Result<(), BrowserError> {
        if policy.is_passthrough() {
            return Ok(());
        }

        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(map_cdp_error)?;

        let mut challenges = match policy.credentials {
            Some(_) => Some(
                self.page
                    .event_listener::<EventAuthRequired>()
                    .await
                    .map_err(map_cdp_error)?,
            ),
            None => None,
        };

        let enable = EnableParams::builder()
            .pattern(RequestPattern::builder().url_pattern("*").build())
            .handle_auth_requests(policy.credentials.is_some())
            .build();
        self.bounded("enable request interception", self.page.execute(enable))
            .await?;

        let page = self.page.clone();
        let request_policy = policy.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();
                let result = if request_policy.blocks(event.resource_type.as_ref()) {
                    page.execute(FailRequestParams::new(
                        request_id,
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ())
                };

                if let Err(e) = result {
                    tracing::trace!("Paused request could not be resolved: {}", e);
                }
            }
        }));

        if let (Some(mut challenges), Some(credentials)) = (challenges.take(), policy.credentials) {
            let page = self.page.clone();
            self.tasks.push(tokio::spawn(async move {
                while let Some(event) = challenges.next().await {
                    let response = AuthChallengeResponse::builder()
                        .response(AuthChallengeResponseResponse::ProvideCredentials)
                        .username(credentials.username.clone())
                        .password(credentials.password.clone())
                        .build();

                    let response = match response {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::warn!("Could not build proxy auth response: {}", e);
                            continue;
                        }
                    };

                    let params = ContinueWithAuthParams::new(event.request_id.clone(), response);
                    if let Err(e) = page.execute(params).await {
                        tracing::debug!("Proxy auth challenge failed: {}", e);
                    }
                }
            }));
        }

        Ok(())
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<Option<u16>, BrowserError> {
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(map_cdp_error)?;

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => return Err(BrowserError::timeout(format!("Navigation to {}", url), timeout)),
            Ok(Err(e)) => return Err(navigation_error(url, e)),
            Ok(Ok(_)) => {}
        }

        // The first Document response is the navigation itself; redirects
        // do not emit responseReceived.
        let status = tokio::time::timeout(STATUS_CAPTURE_WINDOW, async {
            while let Some(event) = responses.next().await {
                if event.r#type == ResourceType::Document {
                    return u16::try_from(event.response.status).ok();
                }
            }
            None
        })
        .await
        .ok()
        .flatten();

        Ok(status)
    }

    async fn wait_for_network_idle(
        &self,
        idle: Duration,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let js = format!(
            r#"(async () => {{
                const timeoutMs = {timeout_ms};
                const idleMs = {idle_ms};
                const interval = 250;
                const start = Date.now();
                let lastCount = 0;
                let stableMs = 0;
                try {{ lastCount = performance.getEntriesByType('resource').length; }} catch (_) {{ lastCount = 0; }}
                while (Date.now() - start < timeoutMs) {{
                    await new Promise(r => setTimeout(r, interval));
                    let curCount = lastCount;
                    try {{ curCount = performance.getEntriesByType('resource').length; }} catch (_) {{ curCount = lastCount; }}
                    if (document.readyState === 'complete' && curCount === lastCount) {{
                        stableMs += interval;
                        if (stableMs >= idleMs) {{ return {{ ok: true, waitedMs: Date.now() - start }}; }}
                    }} else {{
                        stableMs = 0;
                    }}
                    lastCount = curCount;
                }}
                return {{ ok: false, waitedMs: Date.now() - start }};
            }})()"#,
            timeout_ms = timeout.as_millis(),
            idle_ms = idle.as_millis(),
        );

        let ceiling = timeout + Duration::from_secs(5);
        let value = match tokio::time::timeout(ceiling, self.page.evaluate(js)).await {
            Ok(result) => result.map_err(map_cdp_error)?,
            Err(_) => return Err(BrowserError::timeout("Network idle wait", timeout)),
        };

        let info = value
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null);
        let ok = info.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        let waited = info.get("waitedMs").and_then(|v| v.as_u64()).unwrap_or(0);

        if ok {
            tracing::trace!("Network idle reached after {}ms", waited);
            Ok(())
        } else {
            Err(BrowserError::timeout("Network idle wait", timeout))
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::timeout(
                    format!("Waiting for selector '{}'", selector),
                    timeout,
                ));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .bounded("Script evaluation", self.page.evaluate(expression))
            .await?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.bounded("Reading page content", self.page.content()).await
    }

    async fn close(self) -> Result<(), BrowserError> {
        for task in &self.tasks {
            task.abort();
        }
        self.page.close().await.map_err(map_cdp_error)
    }
}

fn map_cdp_error(error: CdpError) -> BrowserError {
    match error {
        CdpError::Timeout => BrowserError::timeout("DevTools request", Duration::ZERO),
        other => BrowserError::from_message(other.to_string()),
    }
}

fn navigation_error(url: &str, error: CdpError) -> BrowserError {
    match map_cdp_error(error) {
        BrowserError::Protocol(message) => BrowserError::Navigation {
            url: url.to_string(),
            message,
        },
        other => other,
    }
}
