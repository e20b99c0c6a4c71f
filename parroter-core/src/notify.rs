//! Channel notification for newly added emoji. Posting is best-effort:
//! a failure here is logged and never changes the run's outcome.

use tracing::{error, info};

use crate::contract::{EmojiService, UploadResult};

/// Formatted summary message listing each added emoji.
pub fn format_notification(added: &[UploadResult]) -> String {
    let s = if added.len() == 1 { "" } else { "s" };
    let mut message = format!("*Added {} new Party Parrot{s}!*", added.len());
    for result in added {
        message.push_str(&format!("\n+ :{slug}: `:{slug}:`", slug = result.slug));
    }
    message
}

/// Post the summary to the configured channel. No-op when nothing was added.
pub async fn post_notification<S>(service: &S, channel: &str, added: &[UploadResult])
where
    S: EmojiService + ?Sized,
{
    if added.is_empty() {
        return;
    }
    match service.post_message(channel, &format_notification(added)).await {
        Ok(()) => info!(channel, count = added.len(), "Posted new-emoji notification"),
        Err(e) => error!(error = ?e, channel, "Unable to send notification message"),
    }
}
