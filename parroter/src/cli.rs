//! CLI surface and run orchestration for parroter.
//!
//! All business logic (catalog parsing, diffing, the install pipeline)
//! lives in `parroter-core`; this module is strictly CLI glue: argument
//! and environment resolution, interactive fallbacks, user-visible output,
//! and the top-level sequence of
//! authenticate → catalog → installed → diff → upload → report.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;

use parroter_core::catalog::{CatalogClient, CatalogEntry, CatalogSelection};
use parroter_core::contract::{EmojiService, ImageFetcher, UploadResult};
use parroter_core::diff::compute_missing;
use parroter_core::install::install_missing;
use parroter_core::notify::post_notification;

use crate::cache::CacheStore;
use crate::prompt;
use crate::session::{self, SessionOptions};
use crate::slack::SlackClient;
use crate::webdriver::Browser;

/// Bulk-add Cult of the Party Parrot emoji to a Slack team.
#[derive(Parser)]
#[clap(name = "parroter", version, about)]
pub struct Cli {
    /// Slack team name. Defaults to the $SLACK_TEAM environment variable.
    #[clap(short = 't', long, env = "SLACK_TEAM")]
    pub team: Option<String>,

    /// Slack user email address. Defaults to $SLACK_EMAIL.
    #[clap(short = 'e', long, env = "SLACK_EMAIL")]
    pub email: Option<String>,

    /// Slack user password. Defaults to $SLACK_PASSWORD.
    #[clap(short = 'p', long, env = "SLACK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Slack channel to send new parrot messages to, e.g. "#general".
    /// Defaults to $SLACK_CHANNEL.
    #[clap(short = 'c', long, env = "SLACK_CHANNEL")]
    pub channel: Option<String>,

    /// Add Party Guests, in addition to standard parrots.
    #[clap(short = 'g', long)]
    pub include_guests: bool,

    /// Add Flag Parrots, in addition to standard parrots.
    #[clap(short = 'f', long)]
    pub include_flags: bool,

    /// Display the team's existing emoji and exit.
    #[clap(short = 'l', long)]
    pub list_existing: bool,

    /// Display all available parrots and exit.
    #[clap(short = 'a', long)]
    pub list_available: bool,

    /// Display the new parrots for the team and exit without uploading.
    #[clap(short = 'n', long)]
    pub list_new: bool,

    /// Force a refresh of cached login data.
    #[clap(short = 'r', long)]
    pub refresh: bool,

    /// Don't prompt for approval before adding parrots.
    #[clap(short = 'q', long)]
    pub quiet: bool,

    /// Browser to use for the headless login step.
    #[clap(short = 'b', long, value_enum, default_value_t = Browser::Chrome)]
    pub browser: Browser,
}

/// Async CLI entrypoint, extracted from `main` for integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let team = match &cli.team {
        Some(team) => team.trim().to_lowercase(),
        None => prompt::team()?,
    };

    // Authentication comes first; everything below needs the session.
    let store = CacheStore::default_location()?;
    let opts = SessionOptions {
        team,
        email: cli.email.clone(),
        password: cli.password.clone(),
        refresh: cli.refresh,
        browser: cli.browser,
    };
    let session = session::acquire(&opts, &store)
        .await
        .context("Slack authentication failed")?;
    let slack = SlackClient::new(&session);

    let catalog_client = CatalogClient::new();
    let selection = CatalogSelection {
        include_guests: cli.include_guests,
        include_flags: cli.include_flags,
    };
    let catalog = catalog_client
        .fetch_catalog(&selection)
        .await
        .map_err(|e| anyhow!("unable to fetch the parrot catalog: {e}"))?;

    execute(&cli, catalog, &slack, &catalog_client).await
}

/// Post-authentication pipeline: list modes, diff, upload, report.
/// Separated from [`run`] so mode tests can drive it against mocked
/// services with a prebuilt catalog.
pub async fn execute<S, F>(
    cli: &Cli,
    catalog: Vec<CatalogEntry>,
    service: &S,
    images: &F,
) -> Result<()>
where
    S: EmojiService + ?Sized,
    F: ImageFetcher + ?Sized,
{
    if cli.list_available {
        println!("Available Parrots:");
        for entry in &catalog {
            println!(":{}:", entry.slug);
        }
        return Ok(());
    }

    let installed = service
        .list_emoji()
        .await
        .map_err(|e| anyhow!("unable to load Slack emoji: {e}"))?;

    if cli.list_existing {
        println!("Existing Parrots:");
        let mut names: Vec<&String> = installed.iter().collect();
        names.sort();
        for name in names {
            println!(":{name}:");
        }
        return Ok(());
    }

    println!("Starting Parroting...");

    let missing = compute_missing(&catalog, &installed);
    if missing.is_empty() {
        println!("No new parrots to add!");
        return Ok(());
    }

    let s = if missing.len() == 1 { "" } else { "s" };
    println!("Found {} new parrot{s} to add!", missing.len());
    for entry in &missing {
        println!(":{}:", entry.slug);
    }

    if cli.list_new {
        return Ok(());
    }

    if !cli.quiet && !prompt::confirm("Add them to your Slack team?")? {
        return Ok(());
    }

    let bar = ProgressBar::new(missing.len() as u64);
    let report = install_missing(service, images, &missing, |_, result| {
        match &result.error {
            None => bar.println(format!("+ Added :{}:", result.slug)),
            Some(reason) => {
                let line = format!("+ Error adding '{}', {}", result.slug, reason);
                bar.suspend(|| eprintln!("{line}"));
            }
        }
        bar.inc(1);
    })
    .await;
    bar.finish_and_clear();

    let added: Vec<UploadResult> = report.added().cloned().collect();
    println!("Successfully added {} new parrots!", added.len());

    if let Some(channel) = &cli.channel {
        post_notification(service, channel, &added).await;
    }

    Ok(())
}
