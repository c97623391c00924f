// scraper/webdriver.rs
//
// Minimal W3C WebDriver client over blocking reqwest, enough to drive one
// chromedriver session through search, scroll and page-source capture.

use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tracing::{debug, warn};

/// The browser operations the live-site adapter needs.
pub trait BrowserSession {
    /// Registers a script evaluated on every new document before page scripts.
    fn add_init_script(&mut self, source: &str) -> Result<(), ScraperError>;
    fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;
    fn execute(&mut self, script: &str) -> Result<Value, ScraperError>;
    fn move_pointer(&mut self, x: i64, y: i64) -> Result<(), ScraperError>;
    fn page_source(&mut self) -> Result<String, ScraperError>;
    fn quit(&mut self) -> Result<(), ScraperError>;
}

/// Creates one exclusive browser session per adapter call.
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(&self, user_agent: &str) -> Result<Self::Session, ScraperError>;
}

/// Owns a session for the duration of one adapter call and quits it when
/// dropped, whichever way the call exits.
pub struct SessionGuard<S: BrowserSession> {
    session: S,
}

impl<S: BrowserSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: BrowserSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowserSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.quit() {
            Ok(()) => debug!("browser session closed"),
            Err(e) => warn!(error = %e, "browser session teardown failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    client: Client,
    endpoint: String,
    headless: bool,
    browser_binary: Option<String>,
}

impl WebDriverLauncher {
    pub fn new(
        endpoint: impl Into<String>,
        headless: bool,
        browser_binary: Option<String>,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headless,
            browser_binary,
        })
    }

    fn capabilities(&self, user_agent: &str) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-gpu".to_string(),
            "--disable-extensions".to_string(),
            "--disable-plugins".to_string(),
            "--disable-sync".to_string(),
            format!("--user-agent={user_agent}"),
        ];
        if self.headless {
            args.insert(0, "--headless=new".to_string());
        }

        let mut chrome_options = json!({
            "args": args,
            "excludeSwitches": ["enable-automation"],
            "useAutomationExtension": false,
            "prefs": { "profile.managed_default_content_settings.images": 2 },
        });
        if let Some(binary) = &self.browser_binary {
            chrome_options["binary"] = json!(binary);
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome_options,
                }
            }
        })
    }
}

impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    fn launch(&self, user_agent: &str) -> Result<WebDriverSession, ScraperError> {
        let value = send_command(
            &self.client,
            Method::POST,
            &format!("{}/session", self.endpoint),
            "new session",
            Some(self.capabilities(user_agent)),
        )?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScraperError::UnexpectedShape("new session without sessionId".into()))?;

        debug!(session_id, "browser session started");

        Ok(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, session_id),
            closed: false,
        })
    }
}

pub struct WebDriverSession {
    client: Client,
    base: String,
    closed: bool,
}

impl WebDriverSession {
    fn command(
        &self,
        method: Method,
        path: &str,
        name: &str,
        body: Option<Value>,
    ) -> Result<Value, ScraperError> {
        send_command(&self.client, method, &format!("{}{}", self.base, path), name, body)
    }
}

impl BrowserSession for WebDriverSession {
    fn add_init_script(&mut self, source: &str) -> Result<(), ScraperError> {
        let body = json!({
            "cmd": "Page.addScriptToEvaluateOnNewDocument",
            "params": { "source": source },
        });
        self.command(Method::POST, "/goog/cdp/execute", "cdp execute", Some(body))?;
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.command(Method::POST, "/url", "navigate", Some(json!({ "url": url })))
            .map_err(|e| ScraperError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    fn execute(&mut self, script: &str) -> Result<Value, ScraperError> {
        let body = json!({ "script": script, "args": [] });
        self.command(Method::POST, "/execute/sync", "execute script", Some(body))
    }

    fn move_pointer(&mut self, x: i64, y: i64) -> Result<(), ScraperError> {
        let body = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [
                    { "type": "pointerMove", "duration": 250, "origin": "viewport", "x": x, "y": y }
                ]
            }]
        });
        self.command(Method::POST, "/actions", "perform actions", Some(body))?;
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, ScraperError> {
        let value = self.command(Method::GET, "/source", "page source", None)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ScraperError::UnexpectedShape("page source is not a string".into()))
    }

    fn quit(&mut self) -> Result<(), ScraperError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", "delete session", None)?;
        Ok(())
    }
}

/// Sends one WebDriver command and unwraps the `value` member of the reply.
/// Error replies (`{"value": {"error", "message"}}`) become `ScraperError::WebDriver`.
fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    name: &str,
    body: Option<Value>,
) -> Result<Value, ScraperError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let resp = request
        .send()
        .map_err(|e| ScraperError::Network(format!("{name}: {e}")))?;

    let status = resp.status();
    let mut payload: Value = resp
        .json()
        .map_err(|e| ScraperError::UnexpectedShape(format!("{name}: {e}")))?;

    let value = payload
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        return Err(ScraperError::WebDriver {
            command: name.to_string(),
            message: format!("HTTP {status}: {error} {message}").trim_end().to_string(),
        });
    }

    Ok(value)
}
