//! Scripted in-memory browser used to drive the coordinator

use async_trait::async_trait;
use sitescout::browser::{
    BrowserEngine, BrowserError, BrowserHandle, InterceptPolicy, PageHandle,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What one navigation to a URL does
#[derive(Debug, Clone)]
pub enum Nav {
    /// Responds with a status and a document
    Page(u16, String),
    /// Fails before any response arrives
    Fail(BrowserError),
}

impl Nav {
    pub fn ok(html: &str) -> Self {
        Nav::Page(200, html.to_string())
    }

    pub fn status(code: u16) -> Self {
        Nav::Page(code, format!("<html><body><h1>{}</h1></body></html>", code))
    }

    pub fn crash() -> Self {
        Nav::Fail(BrowserError::Connection(
            "WebSocket closed with code 1006".to_string(),
        ))
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Nav>>,
    launch_failures: VecDeque<BrowserError>,
    page_failures: usize,
    pages_before_failures: usize,
    idle_fails: bool,
    selector_fails: bool,
    selector_waits: usize,
    launches: Vec<Option<String>>,
    browsers_closed: usize,
    pages_opened: usize,
    pages_open: usize,
    max_pages_open: usize,
    navigations: HashMap<String, usize>,
    policies: Vec<InterceptPolicy>,
}

/// Counters shared by an engine and everything it launched
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<State>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Queues navigations for `url`; the last one repeats forever
    pub fn script(&self, url: &str, navs: Vec<Nav>) -> &Self {
        self.lock()
            .scripts
            .insert(url.to_string(), navs.into_iter().collect());
        self
    }

    /// Makes the next launch fail with `error`
    pub fn fail_launch(&self, error: BrowserError) -> &Self {
        self.lock().launch_failures.push_back(error);
        self
    }

    /// Makes the next `count` page creations fail
    pub fn fail_pages(&self, count: usize) -> &Self {
        self.fail_pages_after(0, count)
    }

    /// Lets `successes` page creations through, then fails the next `count`
    pub fn fail_pages_after(&self, successes: usize, count: usize) -> &Self {
        let mut state = self.lock();
        state.pages_before_failures = successes;
        state.page_failures = count;
        self
    }

    /// Makes every network-idle wait time out
    pub fn fail_network_idle(&self) -> &Self {
        self.lock().idle_fails = true;
        self
    }

    /// Makes every selector wait time out
    pub fn fail_selector(&self) -> &Self {
        self.lock().selector_fails = true;
        self
    }

    pub fn selector_waits(&self) -> usize {
        self.lock().selector_waits
    }

    /// Proxy passed to every launch, in order
    pub fn launches(&self) -> Vec<Option<String>> {
        self.lock().launches.clone()
    }

    pub fn browsers_closed(&self) -> usize {
        self.lock().browsers_closed
    }

    pub fn pages_opened(&self) -> usize {
        self.lock().pages_opened
    }

    pub fn pages_open(&self) -> usize {
        self.lock().pages_open
    }

    pub fn max_pages_open(&self) -> usize {
        self.lock().max_pages_open
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.lock().navigations.get(url).copied().unwrap_or(0)
    }

    pub fn policies(&self) -> Vec<InterceptPolicy> {
        self.lock().policies.clone()
    }
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    type Browser = FakeBrowser;

    async fn launch(&self, proxy: Option<&str>) -> Result<FakeBrowser, BrowserError> {
        let mut state = self.lock();
        state.launches.push(proxy.map(str::to_string));
        if let Some(error) = state.launch_failures.pop_front() {
            return Err(error);
        }
        Ok(FakeBrowser {
            state: Arc::clone(&self.state),
            closed: false,
        })
    }
}

pub struct FakeBrowser {
    state: Arc<Mutex<State>>,
    closed: bool,
}

impl FakeBrowser {
    /// A browser handed in by a caller rather than launched by the coordinator
    pub fn standalone(engine: &FakeEngine) -> Self {
        Self {
            state: Arc::clone(&engine.state),
            closed: false,
        }
    }
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&self) -> Result<FakePage, BrowserError> {
        let mut state = self.state.lock().unwrap();
        if state.pages_before_failures > 0 {
            state.pages_before_failures -= 1;
        } else if state.page_failures > 0 {
            state.page_failures -= 1;
            return Err(BrowserError::Protocol("Target.createTarget failed".to_string()));
        }
        state.pages_opened += 1;
        state.pages_open += 1;
        state.max_pages_open = state.max_pages_open.max(state.pages_open);
        Ok(FakePage {
            state: Arc::clone(&self.state),
            document: Mutex::new(None),
        })
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if !self.closed {
            self.closed = true;
            self.state.lock().unwrap().browsers_closed += 1;
        }
        Ok(())
    }
}

pub struct FakePage {
    state: Arc<Mutex<State>>,
    document: Mutex<Option<String>>,
}

#[async_trait]
impl PageHandle for FakePage {
    fn set_default_timeout(&mut self, _timeout: Duration) {}

    async fn set_user_agent(&self, _user_agent: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn intercept_requests(&mut self, policy: InterceptPolicy) -> Result<(), BrowserError> {
        self.state.lock().unwrap().policies.push(policy);
        Ok(())
    }

    async fn goto(&self, url: &str, _timeout: Duration) -> Result<Option<u16>, BrowserError> {
        let nav = {
            let mut state = self.state.lock().unwrap();
            *state.navigations.entry(url.to_string()).or_insert(0) += 1;
            match state.scripts.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        // Let concurrent contact pages overlap
        tokio::time::sleep(Duration::from_millis(5)).await;

        match nav {
            Some(Nav::Page(status, html)) => {
                *self.document.lock().unwrap() = Some(html);
                Ok(Some(status))
            }
            Some(Nav::Fail(error)) => Err(error),
            None => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn wait_for_network_idle(
        &self,
        _idle: Duration,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.state.lock().unwrap().idle_fails {
            return Err(BrowserError::timeout("network idle", timeout));
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.selector_waits += 1;
        if state.selector_fails {
            return Err(BrowserError::timeout(format!("selector {}", selector), timeout));
        }
        Ok(())
    }

    async fn evaluate(&self, _expression: &str) -> Result<serde_json::Value, BrowserError> {
        let document = self.document.lock().unwrap().clone();
        Ok(document.map_or(serde_json::Value::Null, serde_json::Value::String))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.document
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrowserError::Protocol("no document loaded".to_string()))
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.state.lock().unwrap().pages_open -= 1;
        Ok(())
    }
}
