//! Shared helpers for federation integration tests
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use canopy::prelude::*;

pub fn path(s: &str) -> VPath {
    VPath::parse(s).unwrap()
}

/// A provider owning `/docs`, seeded with a small tree.
pub async fn docs_provider() -> Arc<MemoryProvider> {
    let provider = MemoryProvider::new("repo", "Documents", ["docs"]).unwrap();
    provider.mkdir(&path("/docs/reports")).await.unwrap();
    provider
        .add(&path("/docs/reports/q1.txt"), Bytes::from_static(b"q1 numbers"))
        .await
        .unwrap();
    provider
        .add(&path("/docs/readme.md"), Bytes::from_static(b"hello"))
        .await
        .unwrap();
    Arc::new(provider)
}

/// A provider owning `/media`, seeded with one file.
pub async fn media_provider() -> Arc<MemoryProvider> {
    let provider = MemoryProvider::new("media", "Media library", ["media"]).unwrap();
    provider
        .add(&path("/media/logo.png"), Bytes::from_static(b"png"))
        .await
        .unwrap();
    Arc::new(provider)
}

/// A connection-backed provider owning the `s3` scheme.
pub async fn bucket_provider() -> Arc<MemoryProvider> {
    let provider = MemoryProvider::connection("s3", "Cloud buckets", "s3", ["assets"]).unwrap();
    provider
        .add(&path("s3://assets/banner.jpg"), Bytes::from_static(b"jpg"))
        .await
        .unwrap();
    Arc::new(provider)
}

/// The default two-provider federation over docs + media.
pub async fn federation() -> Federation {
    Federation::new(vec![docs_provider().await, media_provider().await]).unwrap()
}

/// A provider whose every operation fails with the configured message.
/// Ownership still works, so it stands in for a backend that is
/// registered but unreachable.
pub struct FailingProvider {
    kind: String,
    root: String,
    message: String,
}

impl FailingProvider {
    pub fn new(
        kind: impl Into<String>,
        root: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            root: root.into(),
            message: message.into(),
        }
    }

    fn failure(&self) -> Error {
        Error::Other(anyhow::anyhow!("{}", self.message))
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn name(&self) -> &str {
        &self.kind
    }

    fn owns(&self, path: &VPath) -> bool {
        path.scheme().is_none() && path.first_segment() == self.root
    }

    async fn tree(&self, _opts: &TreeOptions) -> Result<Tree> {
        Err(self.failure())
    }

    async fn root_trees(&self, _opts: &TreeOptions) -> Result<Vec<Tree>> {
        Err(self.failure())
    }

    async fn entry(&self, _path: &VPath, _opts: &EntryOptions) -> Result<Entry> {
        Err(self.failure())
    }

    async fn cat(&self, _path: &VPath) -> Result<Bytes> {
        Err(self.failure())
    }

    async fn mkdir(&self, _path: &VPath) -> Result<Entry> {
        Err(self.failure())
    }

    async fn add(&self, _path: &VPath, _content: Bytes) -> Result<Entry> {
        Err(self.failure())
    }

    async fn rm(&self, _path: &VPath) -> Result<()> {
        Err(self.failure())
    }

    async fn purge(&self, _path: &VPath) -> Result<()> {
        Err(self.failure())
    }

    async fn restore(&self, _path: &VPath) -> Result<()> {
        Err(self.failure())
    }

    async fn rename(&self, _path: &VPath, _new_name: &str) -> Result<Entry> {
        Err(self.failure())
    }

    async fn cp(&self, _source: &VPath, _dest: &VPath) -> Result<()> {
        Err(self.failure())
    }

    async fn mv(&self, _source: &VPath, _dest: &VPath) -> Result<()> {
        Err(self.failure())
    }

    async fn metadata(&self, _path: &VPath) -> Result<Metadata> {
        Err(self.failure())
    }

    async fn set_metadata(&self, _path: &VPath, _metadata: Metadata) -> Result<()> {
        Err(self.failure())
    }

    async fn has_access(&self, _path: &VPath) -> Result<bool> {
        Err(self.failure())
    }

    async fn folder_exists(&self, _path: &VPath) -> Result<bool> {
        Err(self.failure())
    }

    async fn deleted_entries(&self) -> Result<Vec<Entry>> {
        Err(self.failure())
    }

    async fn clear_tree_cache(&self) {}
}
