//! Copy, move and rename through the federation

mod common;

use bytes::Bytes;
use canopy::prelude::*;
use common::{docs_provider, federation, path};

#[tokio::test]
async fn test_cp_file_within_provider() {
    let federation = federation().await;
    federation
        .cp(&path("/docs/readme.md"), &path("/docs/reports/copy.md"))
        .await
        .unwrap();

    // both exist, same content
    assert_eq!(
        federation.cat(&path("/docs/readme.md")).await.unwrap(),
        Bytes::from_static(b"hello")
    );
    assert_eq!(
        federation.cat(&path("/docs/reports/copy.md")).await.unwrap(),
        Bytes::from_static(b"hello")
    );
    let copy = federation
        .entry(&path("/docs/reports/copy.md"), &EntryOptions::new())
        .await
        .unwrap();
    assert_eq!(copy.name, "copy.md");
    assert_eq!(copy.parent, Some(path("/docs/reports")));
}

#[tokio::test]
async fn test_cp_folder_copies_the_subtree() {
    let federation = federation().await;
    federation
        .cp(&path("/docs/reports"), &path("/docs/archive"))
        .await
        .unwrap();

    assert!(federation.folder_exists(&path("/docs/archive")).await.unwrap());
    assert_eq!(
        federation.cat(&path("/docs/archive/q1.txt")).await.unwrap(),
        Bytes::from_static(b"q1 numbers")
    );
    // the original subtree is untouched
    assert!(federation
        .cat(&path("/docs/reports/q1.txt"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_mv_relocates_and_removes_the_source() {
    let federation = federation().await;
    federation
        .mv(&path("/docs/reports"), &path("/docs/archive"))
        .await
        .unwrap();

    assert!(matches!(
        federation.cat(&path("/docs/reports/q1.txt")).await,
        Err(Error::NotFound(_))
    ));
    assert_eq!(
        federation.cat(&path("/docs/archive/q1.txt")).await.unwrap(),
        Bytes::from_static(b"q1 numbers")
    );
}

#[tokio::test]
async fn test_cross_provider_transfer_is_rejected() {
    let federation = federation().await;
    let result = federation
        .cp(&path("/docs/readme.md"), &path("/media/readme.md"))
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    let result = federation
        .mv(&path("/docs/readme.md"), &path("/media/readme.md"))
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // nothing moved
    assert!(federation
        .entry(&path("/docs/readme.md"), &EntryOptions::new())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_single_provider_skips_the_ownership_check() {
    // with one provider the destination is handed straight to it: the
    // failure is the provider's (missing parent), not a routing one
    let federation = Federation::new(vec![docs_provider().await]).unwrap();
    let result = federation
        .cp(&path("/docs/readme.md"), &path("/elsewhere/readme.md"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_transfer_guards() {
    let federation = federation().await;

    // occupied destination
    let result = federation
        .cp(&path("/docs/readme.md"), &path("/docs/reports/q1.txt"))
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    // folder into itself
    let result = federation
        .mv(&path("/docs/reports"), &path("/docs/reports/nested"))
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // missing source
    let result = federation
        .mv(&path("/docs/ghost.txt"), &path("/docs/found.txt"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_rename() {
    let federation = federation().await;
    let renamed = federation
        .rename(&path("/docs/readme.md"), "intro.md")
        .await
        .unwrap();
    assert_eq!(renamed.name, "intro.md");
    assert_eq!(renamed.path, path("/docs/intro.md"));
    assert!(matches!(
        federation.cat(&path("/docs/readme.md")).await,
        Err(Error::NotFound(_))
    ));

    // structurally invalid new name
    let result = federation.rename(&path("/docs/intro.md"), "a/b").await;
    assert!(matches!(result, Err(Error::InvalidPath(_))));

    // occupied sibling name
    federation
        .add(&path("/docs/notes.md"), Bytes::from_static(b"n"))
        .await
        .unwrap();
    let result = federation.rename(&path("/docs/notes.md"), "intro.md").await;
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_rename_folder_carries_children() {
    let federation = federation().await;
    federation
        .rename(&path("/docs/reports"), "finance")
        .await
        .unwrap();
    assert_eq!(
        federation.cat(&path("/docs/finance/q1.txt")).await.unwrap(),
        Bytes::from_static(b"q1 numbers")
    );
}
