use parroter_core::catalog::{CatalogEntry, CatalogSet};
use parroter_core::contract::{MockEmojiService, MockImageFetcher, UploadResult};
use parroter_core::install::install_missing;
use parroter_core::notify::{format_notification, post_notification};

fn entry(slug: &str) -> CatalogEntry {
    CatalogEntry {
        name: slug.to_string(),
        slug: slug.to_string(),
        file: format!("{slug}.gif"),
        high_res: false,
        set: CatalogSet::Parrots,
    }
}

#[tokio::test]
async fn one_added_one_rejected_is_a_partial_success() {
    let entries = vec![entry("parrot"), entry("partyparrot")];

    let mut images = MockImageFetcher::new();
    images
        .expect_fetch_image()
        .times(2)
        .returning(|_| Ok(vec![0x47, 0x49, 0x46]));

    let mut service = MockEmojiService::new();
    service.expect_add_emoji().times(2).returning(|slug, _| {
        if slug == "partyparrot" {
            Ok(Some("error_name_taken".to_string()))
        } else {
            Ok(None)
        }
    });

    let report = install_missing(&service, &images, &entries, |_, _| {}).await;

    assert_eq!(report.added_count(), 1);
    assert_eq!(report.failed_count(), 1);
    let failed: Vec<&UploadResult> = report.failed().collect();
    assert_eq!(failed[0].slug, "partyparrot");
    assert_eq!(failed[0].error.as_deref(), Some("error_name_taken"));
}

#[tokio::test]
async fn image_download_failure_does_not_abort_the_batch() {
    let entries = vec![entry("parrot"), entry("fastparrot")];

    let mut images = MockImageFetcher::new();
    images.expect_fetch_image().times(2).returning(|e| {
        if e.slug == "parrot" {
            Err("connection reset".into())
        } else {
            Ok(vec![1, 2, 3])
        }
    });

    let mut service = MockEmojiService::new();
    // Only the entry whose image arrived reaches the service.
    service
        .expect_add_emoji()
        .times(1)
        .withf(|slug, _| slug == "fastparrot")
        .returning(|_, _| Ok(None));

    let report = install_missing(&service, &images, &entries, |_, _| {}).await;

    assert_eq!(report.added_count(), 1);
    assert_eq!(report.failed_count(), 1);
    let failed: Vec<&UploadResult> = report.failed().collect();
    assert_eq!(failed[0].slug, "parrot");
    assert!(failed[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("image download failed")));
}

#[tokio::test]
async fn results_and_progress_follow_entry_order() {
    let entries = vec![entry("a"), entry("b"), entry("c")];

    let mut images = MockImageFetcher::new();
    images.expect_fetch_image().returning(|_| Ok(vec![0]));
    let mut service = MockEmojiService::new();
    service.expect_add_emoji().returning(|_, _| Ok(None));

    let mut seen = Vec::new();
    let report = install_missing(&service, &images, &entries, |entry, result| {
        assert_eq!(entry.slug, result.slug);
        seen.push(result.slug.clone());
    })
    .await;

    assert_eq!(seen, vec!["a", "b", "c"]);
    let order: Vec<&str> = report.results.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn notification_message_pluralizes_and_lists_slugs() {
    let one = vec![UploadResult {
        slug: "parrot".to_string(),
        error: None,
    }];
    assert_eq!(
        format_notification(&one),
        "*Added 1 new Party Parrot!*\n+ :parrot: `:parrot:`"
    );

    let two = vec![
        UploadResult {
            slug: "parrot".to_string(),
            error: None,
        },
        UploadResult {
            slug: "fastparrot".to_string(),
            error: None,
        },
    ];
    let message = format_notification(&two);
    assert!(message.starts_with("*Added 2 new Party Parrots!*"));
    assert!(message.contains("\n+ :fastparrot: `:fastparrot:`"));
}

#[tokio::test]
async fn notification_failure_is_swallowed() {
    let mut service = MockEmojiService::new();
    service
        .expect_post_message()
        .times(1)
        .returning(|_, _| Err("channel_not_found".into()));

    let added = vec![UploadResult {
        slug: "parrot".to_string(),
        error: None,
    }];
    // Must not panic or surface the error.
    post_notification(&service, "#general", &added).await;
}

#[tokio::test]
async fn notification_is_skipped_when_nothing_was_added() {
    let mut service = MockEmojiService::new();
    service.expect_post_message().times(0);
    post_notification(&service, "#general", &[]).await;
}
