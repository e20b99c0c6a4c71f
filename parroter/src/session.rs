//! Session manager: produces an authenticated Slack session with minimal
//! re-authentication.
//!
//! A session is a cookie set plus a web API token, both cached on disk.
//! Cached cookies are replayed when fresh (mtime within
//! [`crate::cache::FRESHNESS_WINDOW`]) and written for the same team; a
//! cached token must additionally pass a live `team.info` identity check.
//! Anything else triggers the interactive browser login behind the
//! [`LoginFlow`] capability trait. Every failure on this path is fatal:
//! without a valid session the rest of the run is meaningless.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::cache::{CacheStore, CookieCache, FRESHNESS_WINDOW};
use crate::prompt;
use crate::slack;
use crate::webdriver::{Browser, BrowserCookie, SlackLoginFlow};

const USER_AGENT: &str = "Mozilla/5.0 Gecko/20100101 Firefox/60.0";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Lowercased team slug, e.g. `myteam` for `myteam.slack.com`.
    pub team: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Ignore all cached login data.
    pub refresh: bool,
    pub browser: Browser,
}

/// An authenticated connection to the team's web/API surface.
pub struct Session {
    pub team: String,
    pub team_url: String,
    pub token: String,
    /// Cookie-carrying HTTP client for the private API.
    pub http: reqwest::Client,
}

/// Capability interface for the interactive login step. The concrete
/// implementation drives a browser; tests (or a future pure-HTTP login)
/// can substitute their own.
#[async_trait]
pub trait LoginFlow: Send {
    /// Perform the login and return the authenticated cookie set.
    async fn login(
        &mut self,
        team_url: &str,
        email: &str,
        password: Option<&str>,
    ) -> Result<Vec<BrowserCookie>>;

    /// Extract the web API token from the authenticated context.
    async fn api_token(&mut self, emoji_url: &str) -> Result<String>;
}

/// Acquire a valid session for the configured team, reusing cached login
/// data where possible.
pub async fn acquire(opts: &SessionOptions, store: &CacheStore) -> Result<Session> {
    let team_url = format!("https://{}.slack.com", opts.team);
    let emoji_url = format!("{team_url}/customize/emoji");

    // The browser is started lazily: a fully cached session never opens one.
    let mut flow: Option<SlackLoginFlow> = None;

    let mut cookies = match cached_cookies(store, opts)? {
        Some(cookies) => {
            info!(team = %opts.team, "Reusing cached session cookies");
            cookies
        }
        None => fresh_login(&mut flow, opts, store, &team_url).await?,
    };

    let mut token = None;
    if !opts.refresh {
        if let Some(candidate) = store.load_api_key()? {
            let probe = http_client(&cookies, &team_url)?;
            if token_matches_team(&probe, &candidate, &opts.team).await? {
                info!(team = %opts.team, "Reusing cached API token");
                token = Some(candidate);
            } else {
                info!(team = %opts.team, "Cached API token is not valid for this team");
            }
        }
    }

    let token = match token {
        Some(token) => token,
        None => {
            // Scraping the token needs a logged-in browser; if the cookies
            // came from cache the browser has not logged in yet.
            if flow.is_none() {
                cookies = fresh_login(&mut flow, opts, store, &team_url).await?;
            }
            let flow = flow.as_mut().context("login flow unavailable")?;
            let token = flow.api_token(&emoji_url).await?;
            store.store_api_key(&token)?;
            token
        }
    };

    if let Some(flow) = flow.take() {
        flow.close().await;
    }

    let http = http_client(&cookies, &team_url)?;
    Ok(Session {
        team: opts.team.clone(),
        team_url,
        token,
        http,
    })
}

/// Whether a cached cookie set may be replayed for this team. A session is
/// valid only for the team it was created against.
fn cache_usable(cache: &CookieCache, team: &str, age: Duration) -> bool {
    !cache.cookies.is_empty() && cache.team == team && age <= FRESHNESS_WINDOW
}

fn cached_cookies(store: &CacheStore, opts: &SessionOptions) -> Result<Option<Vec<BrowserCookie>>> {
    if opts.refresh {
        return Ok(None);
    }
    match store.load_cookies()? {
        Some((cache, age)) if cache_usable(&cache, &opts.team, age) => Ok(Some(cache.cookies)),
        Some((cache, _)) => {
            info!(cached_team = %cache.team, team = %opts.team, "Cached cookies unusable, logging in fresh");
            Ok(None)
        }
        None => Ok(None),
    }
}

async fn fresh_login(
    flow: &mut Option<SlackLoginFlow>,
    opts: &SessionOptions,
    store: &CacheStore,
    team_url: &str,
) -> Result<Vec<BrowserCookie>> {
    let email = match &opts.email {
        Some(email) => email.clone(),
        None => prompt::email()?,
    };

    if flow.is_none() {
        *flow = Some(SlackLoginFlow::start(opts.browser).await?);
    }
    let flow = flow.as_mut().context("login flow unavailable")?;

    let cookies = flow.login(team_url, &email, opts.password.as_deref()).await?;
    store.store_cookies(&CookieCache {
        team: opts.team.clone(),
        cookies: cookies.clone(),
    })?;
    Ok(cookies)
}

/// Lightweight identity check: the token must belong to the requested team.
async fn token_matches_team(http: &reqwest::Client, token: &str, team: &str) -> Result<bool> {
    let name = slack::fetch_team_name(http, slack::API_ROOT, token).await?;
    Ok(name.as_deref() == Some(team))
}

fn http_client(cookies: &[BrowserCookie], team_url: &str) -> Result<reqwest::Client> {
    let url: reqwest::Url = team_url.parse().context("invalid team URL")?;
    let jar = Arc::new(reqwest::cookie::Jar::default());
    for cookie in cookies {
        let mut header = format!("{}={}", cookie.name, cookie.value);
        if let Some(domain) = &cookie.domain {
            header.push_str(&format!("; Domain={domain}"));
        }
        if let Some(path) = &cookie.path {
            header.push_str(&format!("; Path={path}"));
        }
        jar.add_cookie_str(&header, &url);
    }
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_provider(jar)
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_for(team: &str) -> CookieCache {
        CookieCache {
            team: team.to_string(),
            cookies: vec![BrowserCookie {
                name: "d".to_string(),
                value: "secret".to_string(),
                domain: Some(".slack.com".to_string()),
                path: Some("/".to_string()),
                secure: Some(true),
            }],
        }
    }

    #[test]
    fn fresh_cache_for_same_team_is_usable() {
        let cache = cache_for("alpha");
        assert!(cache_usable(&cache, "alpha", Duration::from_secs(60)));
    }

    #[test]
    fn cache_for_another_team_forces_fresh_authentication() {
        let cache = cache_for("alpha");
        assert!(!cache_usable(&cache, "beta", Duration::from_secs(60)));
    }

    #[test]
    fn stale_cache_is_not_usable() {
        let cache = cache_for("alpha");
        assert!(!cache_usable(
            &cache,
            "alpha",
            FRESHNESS_WINDOW + Duration::from_secs(1)
        ));
    }

    #[test]
    fn empty_cookie_set_is_not_usable() {
        let cache = CookieCache {
            team: "alpha".to_string(),
            cookies: vec![],
        };
        assert!(!cache_usable(&cache, "alpha", Duration::from_secs(60)));
    }
}
