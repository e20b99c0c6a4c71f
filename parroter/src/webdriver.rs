//! Minimal W3C WebDriver client and the Slack login flow built on it.
//!
//! Slack's login surface has no stable, documented API, so the login step
//! drives a real (headless) browser through a locally running WebDriver
//! server (chromedriver, geckodriver, ...). The protocol is plain
//! JSON-over-HTTP, so this speaks it directly with `reqwest` rather than
//! pulling in a full browser-automation stack; only the handful of
//! commands the login flow needs are implemented.
//!
//! Everything page-structure-specific (element ids, the confirmation-code
//! widget, the `boot_data` token scrape) lives in [`SlackLoginFlow`], the
//! one [`LoginFlow`] implementation; the session manager never sees a
//! browser.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::prompt;
use crate::session::LoginFlow;

/// W3C element identifier key in element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How long to wait for login-page elements, matching the original flow.
const PAGE_WAIT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Browser-automation backend for the login step. Each maps to the
/// default endpoint of its locally running WebDriver server; set
/// `WEBDRIVER_URL` to override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Browser {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl Browser {
    fn default_endpoint(&self) -> &'static str {
        match self {
            Browser::Chrome | Browser::Edge => "http://localhost:9515",
            Browser::Firefox | Browser::Safari => "http://localhost:4444",
        }
    }

    fn endpoint(&self) -> String {
        std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| self.default_endpoint().to_string())
    }

    fn capabilities(&self) -> Value {
        match self {
            Browser::Chrome => json!({
                "browserName": "chrome",
                "goog:chromeOptions": {"args": ["--headless=new"]}
            }),
            Browser::Edge => json!({
                "browserName": "MicrosoftEdge",
                "ms:edgeOptions": {"args": ["--headless=new"]}
            }),
            Browser::Firefox => json!({
                "browserName": "firefox",
                "moz:firefoxOptions": {"args": ["-headless"]}
            }),
            // safaridriver has no headless mode
            Browser::Safari => json!({"browserName": "safari"}),
        }
    }
}

/// A browser cookie as returned by the WebDriver `GET /cookie` command.
/// Expiry and SameSite attributes are dropped on purpose: the cache's own
/// freshness window governs reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: Option<bool>,
}

pub struct WebDriver {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl WebDriver {
    /// Start a new browser session against the backend's WebDriver server.
    pub async fn start(browser: Browser) -> Result<Self> {
        let endpoint = browser.endpoint();
        let http = reqwest::Client::new();
        info!(endpoint = %endpoint, browser = ?browser, "Starting WebDriver session");

        let body = json!({"capabilities": {"alwaysMatch": browser.capabilities()}});
        let response = http
            .post(format!("{endpoint}/session"))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("WebDriver server not reachable at {endpoint}"))?;
        let status = response.status();
        let value: Value = response
            .json()
            .await
            .context("WebDriver returned a non-JSON response")?;
        if !status.is_success() {
            bail!(
                "failed to start browser session: {}",
                driver_message(&value)
            );
        }
        let session_id = value["value"]["sessionId"]
            .as_str()
            .context("WebDriver response missing sessionId")?
            .to_string();

        Ok(Self {
            http,
            endpoint,
            session_id,
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.context("WebDriver request failed")?;
        let status = response.status();
        let value: Value = response
            .json()
            .await
            .context("WebDriver returned a non-JSON response")?;
        if !status.is_success() {
            bail!("WebDriver command {path} failed: {}", driver_message(&value));
        }
        Ok(value["value"].clone())
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(url = %url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({"url": url})))
            .await?;
        Ok(())
    }

    /// Find one element by CSS selector, returning its element reference.
    pub async fn find(&self, selector: &str) -> Result<String> {
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({"using": "css selector", "value": selector})),
            )
            .await?;
        element_id(&value).with_context(|| format!("no element reference for {selector}"))
    }

    pub async fn find_all(&self, selector: &str) -> Result<Vec<String>> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({"using": "css selector", "value": selector})),
            )
            .await?;
        let refs = value
            .as_array()
            .with_context(|| format!("unexpected element list shape for {selector}"))?;
        Ok(refs.iter().filter_map(element_id).collect())
    }

    /// Poll for an element until it appears or the page wait elapses.
    pub async fn wait_for(&self, selector: &str) -> Result<String> {
        let deadline = Instant::now() + PAGE_WAIT;
        loop {
            if let Ok(element) = self.find(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for page element {selector}");
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn send_keys(&self, element: &str, text: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/element/{element}/value"),
            Some(json!({"text": text})),
        )
        .await?;
        Ok(())
    }

    pub async fn click(&self, element: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/element/{element}/click"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    pub async fn execute(&self, script: &str) -> Result<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({"script": script, "args": []})),
        )
        .await
    }

    /// Poll a script until it yields a non-null value.
    pub async fn wait_for_script(&self, script: &str) -> Result<Value> {
        let deadline = Instant::now() + PAGE_WAIT;
        loop {
            if let Ok(value) = self.execute(script).await {
                if !value.is_null() {
                    return Ok(value);
                }
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for script result: {script}");
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn cookies(&self) -> Result<Vec<BrowserCookie>> {
        let value = self.command(Method::GET, "/cookie", None).await?;
        serde_json::from_value(value).context("unexpected cookie list shape")
    }

    /// End the browser session. Best-effort; the server reaps orphans.
    pub async fn quit(self) {
        let _ = self.command(Method::DELETE, "", None).await;
    }
}

fn element_id(value: &Value) -> Option<String> {
    value[ELEMENT_KEY].as_str().map(str::to_owned)
}

fn driver_message(value: &Value) -> String {
    value["value"]["message"]
        .as_str()
        .or_else(|| value["message"].as_str())
        .unwrap_or("unknown WebDriver error")
        .to_string()
}

/// The scripted Slack login: email submission, optional emailed
/// confirmation code, then cookie and API-token extraction.
pub struct SlackLoginFlow {
    driver: WebDriver,
}

impl SlackLoginFlow {
    pub async fn start(browser: Browser) -> Result<Self> {
        Ok(Self {
            driver: WebDriver::start(browser).await?,
        })
    }

    pub async fn close(self) {
        self.driver.quit().await;
    }

    async fn login_form(&self, team_url: &str) -> Result<String> {
        self.driver.goto(team_url).await?;
        if let Ok(form) = self.driver.wait_for("#signup_email").await {
            return Ok(form);
        }
        // SSO-fronted teams hide the form; retry via the non-SSO page.
        self.driver.goto(&format!("{team_url}/?no_sso=1")).await?;
        self.driver
            .wait_for("#signup_email")
            .await
            .context("there was a problem logging in to Slack: login form not found")
    }

    async fn submit_confirmation_code(&self) -> Result<()> {
        let digits = prompt::confirmation_code()?;
        let inputs = self.driver.find_all("input[maxlength=\"1\"]").await?;
        for (element, digit) in inputs.iter().zip(digits.chars()) {
            self.driver.send_keys(element, &digit.to_string()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LoginFlow for SlackLoginFlow {
    async fn login(
        &mut self,
        team_url: &str,
        email: &str,
        password: Option<&str>,
    ) -> Result<Vec<BrowserCookie>> {
        let form = self.login_form(team_url).await?;
        self.driver.send_keys(&form, email).await?;
        if let Some(password) = password {
            if let Ok(field) = self.driver.find("#password").await {
                self.driver.send_keys(&field, password).await?;
            }
        }
        let submit = self.driver.find("#submit_btn").await?;
        self.driver.click(&submit).await?;

        // Some accounts require an emailed one-time code.
        if self
            .driver
            .wait_for("div[data-qa=\"confirmation_code_input\"]")
            .await
            .is_ok()
        {
            self.submit_confirmation_code().await?;
        }

        // Logged-in pages expose the team config in local storage.
        let config = self
            .driver
            .wait_for_script("return localStorage.localConfig_v2")
            .await
            .context("there was a problem logging in to Slack; check your team, email, and password and try again")?;
        let teams_present = config
            .as_str()
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .map(|parsed| parsed["teams"].as_object().is_some_and(|t| !t.is_empty()))
            .unwrap_or(false);
        if !teams_present {
            bail!("there was a problem logging in to Slack; check your team, email, and password and try again");
        }

        info!(team_url = %team_url, "Browser login succeeded");
        self.driver.cookies().await
    }

    async fn api_token(&mut self, emoji_url: &str) -> Result<String> {
        self.driver.goto(emoji_url).await?;
        let token = self
            .driver
            .wait_for_script("return window.boot_data && window.boot_data.api_token")
            .await
            .context("unable to extract an API token from the emoji page")?;
        token
            .as_str()
            .map(str::to_owned)
            .context("unexpected API token shape in page data")
    }
}
