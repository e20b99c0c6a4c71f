//! On-disk session caches: a JSON cookie blob and a plain-text API token.
//!
//! These two files are the only persisted state the program owns. The
//! cookie cache records the team it was written for and is considered
//! stale once its modification time exceeds [`FRESHNESS_WINDOW`]; the API
//! token is additionally validated against the remote service before reuse.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::webdriver::BrowserCookie;

/// Default mtime-based freshness window for cached cookies.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60 * 60);

const COOKIES_FILE: &str = "cookies.json";
const API_KEY_FILE: &str = "api_key";

/// Cached cookie set, keyed by the team it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieCache {
    pub team: String,
    pub cookies: Vec<BrowserCookie>,
}

pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Store rooted in the platform cache directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::cache_dir()
            .context("no cache directory available on this platform")?
            .join("em-slack-parroter");
        Ok(Self::at(dir))
    }

    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Load the cookie cache and its age. A missing or unreadable cache is
    /// `None`: the caller falls back to a fresh login.
    pub fn load_cookies(&self) -> Result<Option<(CookieCache, Duration)>> {
        let path = self.dir.join(COOKIES_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context(format!("failed to read {}", path.display())),
        };

        let cache: CookieCache = match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Discarding unreadable cookie cache");
                return Ok(None);
            }
        };

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|mtime| mtime.elapsed().unwrap_or_default())
            .unwrap_or(Duration::MAX);
        debug!(team = %cache.team, age_secs = age.as_secs(), "Loaded cookie cache");
        Ok(Some((cache, age)))
    }

    pub fn store_cookies(&self, cache: &CookieCache) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(COOKIES_FILE);
        let content = serde_json::to_string(cache).context("failed to serialize cookie cache")?;
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(team = %cache.team, path = %path.display(), "Stored cookie cache");
        Ok(())
    }

    pub fn load_api_key(&self) -> Result<Option<String>> {
        let path = self.dir.join(API_KEY_FILE);
        match fs::read_to_string(&path) {
            Ok(token) => {
                let token = token.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(format!("failed to read {}", path.display())),
        }
    }

    pub fn store_api_key(&self, token: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(API_KEY_FILE);
        fs::write(&path, token).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
