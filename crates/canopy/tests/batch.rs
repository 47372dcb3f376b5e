//! Batch operations: partial failure reporting, never short-circuiting

mod common;

use bytes::Bytes;
use canopy::prelude::*;
use common::{federation, path};

fn expect_report(err: Error) -> BatchFailureReport {
    match err {
        Error::Batch(report) => report,
        other => panic!("expected a batch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_partial_failure_is_reported_and_work_still_happens() {
    let federation = federation().await;
    let owned = path("/docs/readme.md");
    let unowned = path("/other/file.txt");

    let err = federation
        .rm_many(&[owned.clone(), unowned.clone()])
        .await
        .unwrap_err();
    let report = expect_report(err);
    assert_eq!(report.len(), 1);
    assert!(matches!(report.get(&unowned), Some(Error::NotFound(_))));
    assert!(report.get(&owned).is_none());

    // the owned deletion went through regardless of the failure
    let result = federation.entry(&owned, &EntryOptions::new()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(federation.deleted_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fully_successful_batch_is_silent() {
    let federation = federation().await;
    federation
        .rm_many(&[path("/docs/readme.md"), path("/media/logo.png")])
        .await
        .unwrap();
    assert_eq!(federation.deleted_entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failures_keep_call_order() {
    let federation = federation().await;
    let err = federation
        .rm_many(&[
            path("/zzz/first.txt"),
            path("/docs/readme.md"),
            path("/aaa/second.txt"),
        ])
        .await
        .unwrap_err();
    let report = expect_report(err);
    assert_eq!(
        report.paths().map(ToString::to_string).collect::<Vec<_>>(),
        ["/zzz/first.txt", "/aaa/second.txt"]
    );
}

#[tokio::test]
async fn test_restore_many_partial_failure() {
    let federation = federation().await;
    let readme = path("/docs/readme.md");
    let logo = path("/media/logo.png");
    federation.rm_many(&[readme.clone(), logo.clone()]).await.unwrap();

    let never_trashed = path("/docs/reports/q1.txt");
    let err = federation
        .restore_many(&[readme.clone(), never_trashed.clone(), logo.clone()])
        .await
        .unwrap_err();
    let report = expect_report(err);
    assert_eq!(report.len(), 1);
    assert!(matches!(report.get(&never_trashed), Some(Error::NotFound(_))));

    // both real restores happened
    assert!(federation.entry(&readme, &EntryOptions::new()).await.is_ok());
    assert!(federation.entry(&logo, &EntryOptions::new()).await.is_ok());
}

#[tokio::test]
async fn test_purge_many_partial_failure() {
    let federation = federation().await;
    let err = federation
        .purge_many(&[path("/docs/readme.md"), path("/other/x")])
        .await
        .unwrap_err();
    let report = expect_report(err);
    assert_eq!(report.len(), 1);
    assert!(matches!(
        report.get(&path("/other/x")),
        Some(Error::NotFound(_))
    ));
    // purged entries never reach the trash
    assert!(federation.deleted_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cross_provider_move_is_a_per_item_failure() {
    let federation = federation().await;
    let items = [
        // destination owned by a different provider
        (path("/docs/readme.md"), path("/media/readme.md")),
        // in-provider move, should proceed
        (path("/docs/reports/q1.txt"), path("/docs/q1.txt")),
    ];

    let err = federation.mv_many(&items).await.unwrap_err();
    let report = expect_report(err);
    assert_eq!(report.len(), 1);
    assert!(matches!(
        report.get(&path("/docs/readme.md")),
        Some(Error::InvalidOperation(_))
    ));

    // the valid item was still processed
    assert!(federation
        .entry(&path("/docs/q1.txt"), &EntryOptions::new())
        .await
        .is_ok());
    // and the rejected source is untouched
    assert!(federation
        .entry(&path("/docs/readme.md"), &EntryOptions::new())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cp_many_reports_by_source_path() {
    let federation = federation().await;
    let items = [
        (path("/docs/readme.md"), path("/docs/reports/readme.md")),
        // copying a path onto itself is rejected
        (path("/media/logo.png"), path("/media/logo.png")),
    ];

    let err = federation.cp_many(&items).await.unwrap_err();
    let report = expect_report(err);
    assert_eq!(report.len(), 1);
    assert!(report.get(&path("/media/logo.png")).is_some());

    let copied = federation
        .cat(&path("/docs/reports/readme.md"))
        .await
        .unwrap();
    assert_eq!(copied, Bytes::from_static(b"hello"));
}
