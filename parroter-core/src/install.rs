//! Sequential install pipeline: download each missing emoji image and
//! submit it to the team's emoji-creation endpoint.
//!
//! Uploads are strictly one-at-a-time: the destination service is
//! rate-sensitive and the batch sizes are small. A failure on one entry
//! (bad image fetch, rejected upload, duplicate-name race) is recorded and
//! logged, and the batch continues; per-item failures never abort the run.
//!
//! # Callable From
//! - Used by the CLI crate and by integration tests with mocked services.

use tracing::{error, info};

use crate::catalog::CatalogEntry;
use crate::contract::{EmojiService, ImageFetcher, UploadResult};

/// Aggregated outcome of one install batch, in entry order.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub results: Vec<UploadResult>,
}

impl InstallReport {
    pub fn added(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| r.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    pub fn added_count(&self) -> usize {
        self.added().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Install every entry in order, invoking `progress` once per entry with
/// its outcome. Never fails as a whole: all errors are per-item.
pub async fn install_missing<S, F, P>(
    service: &S,
    images: &F,
    entries: &[CatalogEntry],
    mut progress: P,
) -> InstallReport
where
    S: EmojiService + ?Sized,
    F: ImageFetcher + ?Sized,
    P: FnMut(&CatalogEntry, &UploadResult),
{
    let mut report = InstallReport::default();

    for entry in entries {
        let result = install_one(service, images, entry).await;
        match &result.error {
            None => info!(slug = %result.slug, "Added emoji"),
            Some(reason) => {
                error!(slug = %result.slug, reason = %reason, "Failed to add emoji")
            }
        }
        progress(entry, &result);
        report.results.push(result);
    }

    info!(
        added = report.added_count(),
        failed = report.failed_count(),
        "Install batch finished"
    );
    report
}

async fn install_one<S, F>(service: &S, images: &F, entry: &CatalogEntry) -> UploadResult
where
    S: EmojiService + ?Sized,
    F: ImageFetcher + ?Sized,
{
    let image = match images.fetch_image(entry).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return UploadResult {
                slug: entry.slug.clone(),
                error: Some(format!("image download failed: {e}")),
            }
        }
    };

    match service.add_emoji(&entry.slug, image).await {
        Ok(None) => UploadResult {
            slug: entry.slug.clone(),
            error: None,
        },
        Ok(Some(reason)) => UploadResult {
            slug: entry.slug.clone(),
            error: Some(reason),
        },
        Err(e) => UploadResult {
            slug: entry.slug.clone(),
            error: Some(format!("upload failed: {e}")),
        },
    }
}
