use clap::Parser;

use parroter::cli::{execute, Cli};
use parroter_core::catalog::{CatalogEntry, CatalogSet};
use parroter_core::contract::{InstalledEmojiSet, MockEmojiService, MockImageFetcher};

fn entry(slug: &str) -> CatalogEntry {
    CatalogEntry {
        name: slug.to_string(),
        slug: slug.to_string(),
        file: format!("{slug}.gif"),
        high_res: false,
        set: CatalogSet::Parrots,
    }
}

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["parroter"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[tokio::test]
async fn list_available_exits_before_any_installed_list_fetch() {
    let catalog = vec![entry("parrot"), entry("fastparrot")];

    let mut service = MockEmojiService::new();
    service.expect_list_emoji().times(0);
    service.expect_add_emoji().times(0);
    let mut images = MockImageFetcher::new();
    images.expect_fetch_image().times(0);

    let result = execute(&cli(&["--list-available"]), catalog, &service, &images).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn list_new_fetches_the_installed_set_but_uploads_nothing() {
    let catalog = vec![entry("parrot"), entry("fastparrot")];

    let mut service = MockEmojiService::new();
    service.expect_list_emoji().times(1).returning(|| {
        Ok(["parrot".to_string()]
            .into_iter()
            .collect::<InstalledEmojiSet>())
    });
    service.expect_add_emoji().times(0);
    let mut images = MockImageFetcher::new();
    images.expect_fetch_image().times(0);

    let result = execute(&cli(&["--list-new"]), catalog, &service, &images).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn quiet_run_uploads_only_the_missing_entries() {
    let catalog = vec![entry("parrot"), entry("fastparrot")];

    let mut service = MockEmojiService::new();
    service
        .expect_list_emoji()
        .times(1)
        .returning(|| Ok(["parrot".to_string()].into_iter().collect()));
    service
        .expect_add_emoji()
        .times(1)
        .withf(|slug, _| slug == "fastparrot")
        .returning(|_, _| Ok(None));
    let mut images = MockImageFetcher::new();
    images.expect_fetch_image().times(1).returning(|_| Ok(vec![0]));

    let result = execute(&cli(&["--quiet"]), catalog, &service, &images).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn fatal_installed_list_failure_aborts_the_run() {
    let catalog = vec![entry("parrot")];

    let mut service = MockEmojiService::new();
    service
        .expect_list_emoji()
        .times(1)
        .returning(|| Err("invalid_auth".into()));
    service.expect_add_emoji().times(0);
    let images = MockImageFetcher::new();

    let result = execute(&cli(&["--quiet"]), catalog, &service, &images).await;
    let err = result.expect_err("a failed emoji.list must abort the run");
    assert!(err.to_string().contains("unable to load Slack emoji"));
}
