//! # contract: service traits between the pipeline and the outside world
//!
//! This module defines the two trait seams the install pipeline depends on,
//! plus the plain data types that cross them:
//!
//! - [`EmojiService`]: the team messaging service's private emoji API
//!   (list installed emoji, add an emoji, post a channel message).
//! - [`ImageFetcher`]: retrieval of raw image bytes for a catalog entry
//!   from the public asset host.
//!
//! ## Interface & Extensibility
//! - Implement [`EmojiService`] to target a real service or a test double.
//! - All methods are async, returning results with boxed error types.
//! - Error handling is uniform: transport and protocol failures become
//!   boxed trait objects; a server-side *rejection* of one emoji name is
//!   data (see [`EmojiService::add_emoji`]), not an `Err`, because the
//!   batch must continue past it.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use std::collections::HashSet;

use async_trait::async_trait;
use mockall::automock;

use crate::catalog::CatalogEntry;

/// Boxed error type shared by all service traits.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// The set of emoji names already registered for the team.
///
/// Membership checks are read-only; the diff step never mutates this.
#[derive(Debug, Clone, Default)]
pub struct InstalledEmojiSet {
    names: HashSet<String>,
}

impl InstalledEmojiSet {
    pub fn new(names: HashSet<String>) -> Self {
        Self { names }
    }

    /// Case-sensitive exact membership check, matching the service's own
    /// naming rules.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }
}

impl FromIterator<String> for InstalledEmojiSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Outcome of attempting to add one catalog entry to the team.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub slug: String,
    /// `None` on success; the server-reported (or transport) reason on failure.
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Trait for the team's private emoji API surface.
///
/// The implementor is responsible for authentication and transport; the
/// pipeline only sees these three operations.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EmojiService: Send + Sync {
    /// Fetch the set of emoji names already registered for the team.
    /// An error here is fatal for the run.
    async fn list_emoji(&self) -> Result<InstalledEmojiSet, ServiceError>;

    /// Submit one emoji image under the given name.
    ///
    /// Returns `Ok(None)` when the service accepted the emoji, and
    /// `Ok(Some(reason))` when the service rejected it (e.g. a
    /// `error_name_taken` race). Only transport-level failures are `Err`.
    async fn add_emoji(&self, slug: &str, image: Vec<u8>) -> Result<Option<String>, ServiceError>;

    /// Post a plain-text message to a channel.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ServiceError>;
}

/// Trait for downloading the image bytes behind a catalog entry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, entry: &CatalogEntry) -> Result<Vec<u8>, ServiceError>;
}
