//! Catalog retrieval: fetches the upstream emoji listings and normalizes
//! them into [`CatalogEntry`] values with deterministic slugs.
//!
//! The listings live as YAML documents in the cultofthepartyparrot.com
//! repository on GitHub raw content; the corresponding image files sit next
//! to them under per-set directories. Catalogs change upstream, so there is
//! no caching here: every run is a live fetch.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::contract::{ImageFetcher, ServiceError};

/// GitHub raw-content root of the cultofthepartyparrot.com repository.
pub const CATALOG_ROOT: &str =
    "https://raw.githubusercontent.com/jmhobbs/cultofthepartyparrot.com/main";

/// Which upstream listing an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogSet {
    Parrots,
    Guests,
    Flags,
}

impl CatalogSet {
    /// File name of the set's YAML listing under the catalog root.
    pub fn listing_file(&self) -> &'static str {
        match self {
            CatalogSet::Parrots => "parrots.yaml",
            CatalogSet::Guests => "guests.yaml",
            CatalogSet::Flags => "flags.yaml",
        }
    }

    /// Directory of the set's image files under the catalog root.
    pub fn image_dir(&self) -> &'static str {
        match self {
            CatalogSet::Parrots => "parrots",
            CatalogSet::Guests => "guests",
            CatalogSet::Flags => "flags",
        }
    }
}

/// Which sets to fetch. The standard parrots are always included; guests
/// and flags are opt-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSelection {
    pub include_guests: bool,
    pub include_flags: bool,
}

impl CatalogSelection {
    /// Fetch order: standard entries before guest entries before flag
    /// entries. The diff preserves this order.
    pub fn sets(&self) -> Vec<CatalogSet> {
        let mut sets = vec![CatalogSet::Parrots];
        if self.include_guests {
            sets.push(CatalogSet::Guests);
        }
        if self.include_flags {
            sets.push(CatalogSet::Flags);
        }
        sets
    }
}

/// Raw shape of one listing entry as published upstream.
#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    name: Option<String>,
    gif: Option<String>,
    hd: Option<String>,
}

/// One emoji available in a remote catalog, normalized for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Human-readable display name from the listing.
    pub name: String,
    /// Service-safe name derived from the image reference.
    pub slug: String,
    /// Image path relative to the set's image directory.
    pub file: String,
    /// True when the preferred `hd` variant is used.
    pub high_res: bool,
    pub set: CatalogSet,
}

impl CatalogEntry {
    /// Absolute URL of the image file under the given catalog root.
    pub fn image_url(&self, root: &str) -> String {
        format!("{}/{}/{}", root, self.set.image_dir(), self.file)
    }
}

/// Derive the slug from an `hd` reference like `hd/partyparrot.png`:
/// the segment between the directory separator and the extension.
fn slug_from_hd(path: &str) -> Option<String> {
    path.split(['/', '.'])
        .nth(1)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Derive the slug from a `gif` reference like `partyparrot.gif`:
/// everything before the first dot.
fn slug_from_gif(path: &str) -> Option<String> {
    path.split('.')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Parse one set's YAML listing into normalized entries.
///
/// An `hd` reference is always preferred over the standard `gif` one.
/// Entries with neither reference cannot be uploaded and are skipped with
/// a diagnostic rather than silently dropped.
pub fn parse_listing(yaml: &str, set: CatalogSet) -> Result<Vec<CatalogEntry>, ServiceError> {
    let raw: Vec<RawEntry> = serde_yaml::from_str(yaml)
        .map_err(|e| -> ServiceError { format!("invalid catalog listing: {e}").into() })?;

    let mut entries = Vec::with_capacity(raw.len());
    for item in raw {
        let (slug, file, high_res) = match (&item.hd, &item.gif) {
            (Some(hd), _) => match slug_from_hd(hd) {
                Some(slug) => (slug, hd.clone(), true),
                None => {
                    warn!(set = ?set, reference = %hd, "Skipping catalog entry with malformed hd reference");
                    continue;
                }
            },
            (None, Some(gif)) => match slug_from_gif(gif) {
                Some(slug) => (slug, gif.clone(), false),
                None => {
                    warn!(set = ?set, reference = %gif, "Skipping catalog entry with malformed gif reference");
                    continue;
                }
            },
            (None, None) => {
                warn!(set = ?set, name = ?item.name, "Skipping catalog entry with no image reference");
                continue;
            }
        };

        let name = item.name.unwrap_or_else(|| slug.clone());
        entries.push(CatalogEntry {
            name,
            slug,
            file,
            high_res,
            set,
        });
    }
    Ok(entries)
}

/// Client for the public catalog asset host: listing documents and image
/// files. Also serves as the pipeline's [`ImageFetcher`].
pub struct CatalogClient {
    http: reqwest::Client,
    root: String,
}

impl CatalogClient {
    pub fn new() -> Self {
        Self::with_root(CATALOG_ROOT)
    }

    /// Root override, used by tests and mirrors.
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            root: root.into(),
        }
    }

    /// Fetch and parse one set's listing. Non-2xx is an error: a broken
    /// catalog makes the whole run meaningless.
    pub async fn fetch_set(&self, set: CatalogSet) -> Result<Vec<CatalogEntry>, ServiceError> {
        let url = format!("{}/{}", self.root, set.listing_file());
        info!(url = %url, set = ?set, "Fetching emoji catalog listing");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let text = response.text().await?;
        let entries = parse_listing(&text, set)?;
        info!(set = ?set, count = entries.len(), "Parsed catalog listing");
        Ok(entries)
    }

    /// Fetch every selected set, preserving listing order within and
    /// across sets.
    pub async fn fetch_catalog(
        &self,
        selection: &CatalogSelection,
    ) -> Result<Vec<CatalogEntry>, ServiceError> {
        let mut catalog = Vec::new();
        for set in selection.sets() {
            catalog.extend(self.fetch_set(set).await?);
        }
        Ok(catalog)
    }
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for CatalogClient {
    async fn fetch_image(&self, entry: &CatalogEntry) -> Result<Vec<u8>, ServiceError> {
        let url = entry.image_url(&self.root);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
