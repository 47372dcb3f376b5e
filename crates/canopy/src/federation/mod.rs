//! The aggregator that turns N independent providers into one logical
//! file service.
//!
//! The federation owns no storage. It resolves which provider handles a
//! path, delegates, merges fan-out results where an operation spans
//! providers, runs the decoration pipeline over successful retrievals,
//! and folds per-item batch failures into one structured error. It is
//! stateless apart from its immutable provider registry and decorator,
//! holds no locks, and performs no caching of its own — tree caching is
//! provider-owned.
//!
//! Provider calls are awaited sequentially; there is no parallel
//! fan-out and no timeout or cancellation contract at this layer.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::decorate::{Decorator, NullDecorator};
use crate::entry::{
    Capabilities, ContentType, Entry, EntryKind, EntryOptions, Metadata, Tree, TreeOptions,
};
use crate::error::{BatchFailureReport, Error, Result};
use crate::path::VPath;
use crate::provider::Provider;

/// Name of the synthetic aggregate root node.
pub const AGGREGATE_ROOT_NAME: &str = "federation";
/// Provider tag stamped on the synthetic aggregate root.
pub const AGGREGATE_PROVIDER: &str = "federation";

/// One coherent, path-addressable file tree over an ordered set of
/// providers.
///
/// Exactly one provider is expected to own any given path; when several
/// claim the same root the first registered one wins. With exactly one
/// registered provider the ownership check is skipped entirely and every
/// path reaches that provider, even paths it would not normally own.
pub struct Federation {
    providers: Vec<Arc<dyn Provider>>,
    decorator: Arc<dyn Decorator>,
}

impl Federation {
    /// A federation without enrichment. Fails on an empty registry.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Result<Self> {
        Self::with_decorator(providers, Arc::new(NullDecorator))
    }

    /// A federation running `decorator` after every successful
    /// retrieval. Fails on an empty registry.
    pub fn with_decorator(
        providers: Vec<Arc<dyn Provider>>,
        decorator: Arc<dyn Decorator>,
    ) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::invalid_operation(
                "a federation requires at least one provider",
            ));
        }
        Ok(Self {
            providers,
            decorator,
        })
    }

    /// The registry, in registration order.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    fn sole_provider(&self) -> Option<&Arc<dyn Provider>> {
        match self.providers.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Resolve the provider responsible for `path`: linear scan in
    /// registration order, first owner wins. Unowned paths report
    /// `NotFound` — indistinguishable from a missing entry.
    fn provider_for(&self, path: &VPath) -> Result<&Arc<dyn Provider>> {
        if let Some(only) = self.sole_provider() {
            return Ok(only);
        }
        self.providers
            .iter()
            .find(|provider| provider.owns(path))
            .ok_or_else(|| Error::NotFound(path.clone()))
    }

    /// A fresh descriptor for the entry at `path`, decorated.
    pub async fn entry(&self, path: &VPath, opts: &EntryOptions) -> Result<Entry> {
        let mut entry = self.provider_for(path)?.entry(path, opts).await?;
        if let Err(err) = self.decorator.decorate_entry(self, &mut entry, opts).await {
            warn!(path = %path, error = %err, "entry decoration failed");
        }
        Ok(entry)
    }

    /// The content of the file at `path`.
    pub async fn cat(&self, path: &VPath) -> Result<Bytes> {
        self.provider_for(path)?.cat(path).await
    }

    /// Retrieve a tree.
    ///
    /// With a base path the owning provider serves the call unchanged.
    /// Without one, every provider's tree is collected under a synthetic
    /// aggregate root; providers that fail are skipped and logged unless
    /// all of them fail, in which case the first failure is surfaced. A
    /// single-provider federation returns its provider's tree with no
    /// synthetic wrapper.
    pub async fn tree(&self, opts: &TreeOptions) -> Result<Tree> {
        let mut tree = match &opts.base {
            Some(base) => self.provider_for(base)?.tree(opts).await?,
            None => self.aggregate_tree(opts).await?,
        };
        self.decorate_tree(&mut tree, opts).await;
        Ok(tree)
    }

    async fn aggregate_tree(&self, opts: &TreeOptions) -> Result<Tree> {
        if let Some(only) = self.sole_provider() {
            return only.tree(opts).await;
        }
        let mut children = Vec::with_capacity(self.providers.len());
        let mut first_failure = None;
        for provider in &self.providers {
            match provider.tree(opts).await {
                Ok(tree) => children.push(tree),
                Err(err) => {
                    warn!(
                        provider = provider.kind(),
                        error = %err,
                        "provider failed during tree aggregation, skipping"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }
        match first_failure {
            Some(err) if children.is_empty() => Err(err),
            _ => Ok(Tree::with_children(Self::aggregate_root(), children)),
        }
    }

    /// The real root trees of every provider, flattened in registration
    /// order. Never wraps in a synthetic root, never routes by base path
    /// (any supplied base is ignored), and skips failing providers.
    pub async fn root_trees(&self, opts: &TreeOptions) -> Result<Vec<Tree>> {
        let opts = TreeOptions {
            base: None,
            ..opts.clone()
        };
        let mut trees = Vec::new();
        for provider in &self.providers {
            match provider.root_trees(&opts).await {
                Ok(mut roots) => trees.append(&mut roots),
                Err(err) => {
                    warn!(
                        provider = provider.kind(),
                        error = %err,
                        "provider failed during root tree aggregation, skipping"
                    );
                }
            }
        }
        for tree in &mut trees {
            self.decorate_tree(tree, &opts).await;
        }
        Ok(trees)
    }

    /// Create a folder at `path`.
    pub async fn mkdir(&self, path: &VPath) -> Result<Entry> {
        self.provider_for(path)?.mkdir(path).await
    }

    /// Create a file at `path` with the given content.
    pub async fn add(&self, path: &VPath, content: Bytes) -> Result<Entry> {
        self.provider_for(path)?.add(path, content).await
    }

    /// Move the entry at `path` to its provider's trash.
    pub async fn rm(&self, path: &VPath) -> Result<()> {
        self.provider_for(path)?.rm(path).await
    }

    /// Permanently delete the entry at `path`.
    pub async fn purge(&self, path: &VPath) -> Result<()> {
        self.provider_for(path)?.purge(path).await
    }

    /// Bring a trashed entry back to its original location.
    pub async fn restore(&self, path: &VPath) -> Result<()> {
        self.provider_for(path)?.restore(path).await
    }

    /// Rename the entry at `path` in place.
    pub async fn rename(&self, path: &VPath, new_name: &str) -> Result<Entry> {
        self.provider_for(path)?.rename(path, new_name).await
    }

    /// Copy `source` (and its subtree) to `dest` within one provider.
    pub async fn cp(&self, source: &VPath, dest: &VPath) -> Result<()> {
        let provider = self.provider_for(source)?;
        self.require_same_provider(provider, source, dest)?;
        provider.cp(source, dest).await
    }

    /// Move `source` (and its subtree) to `dest` within one provider.
    pub async fn mv(&self, source: &VPath, dest: &VPath) -> Result<()> {
        let provider = self.provider_for(source)?;
        self.require_same_provider(provider, source, dest)?;
        provider.mv(source, dest).await
    }

    /// Copies and moves never span providers; the destination must
    /// resolve to the provider owning the source. Vacuous in
    /// single-provider mode.
    fn require_same_provider(
        &self,
        provider: &Arc<dyn Provider>,
        source: &VPath,
        dest: &VPath,
    ) -> Result<()> {
        if self.sole_provider().is_some() || provider.owns(dest) {
            return Ok(());
        }
        Err(Error::invalid_operation(format!(
            "cannot copy or move {source} to {dest}: destination is outside provider {}",
            provider.kind()
        )))
    }

    /// The metadata map of the entry at `path`, decorated.
    pub async fn metadata(&self, path: &VPath) -> Result<Metadata> {
        let mut metadata = self.provider_for(path)?.metadata(path).await?;
        if let Err(err) = self
            .decorator
            .decorate_metadata(self, path, &mut metadata)
            .await
        {
            warn!(path = %path, error = %err, "metadata decoration failed");
        }
        Ok(metadata)
    }

    /// Replace the metadata map of the entry at `path`.
    pub async fn set_metadata(&self, path: &VPath, metadata: Metadata) -> Result<()> {
        self.provider_for(path)?.set_metadata(path, metadata).await
    }

    /// Whether the caller may access the content at `path`.
    pub async fn has_access(&self, path: &VPath) -> Result<bool> {
        self.provider_for(path)?.has_access(path).await
    }

    /// Whether a folder currently exists at `path`.
    pub async fn folder_exists(&self, path: &VPath) -> Result<bool> {
        self.provider_for(path)?.folder_exists(path).await
    }

    /// Every provider's trashed entries, concatenated in registration
    /// order. Failing providers are skipped and logged.
    pub async fn deleted_entries(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for provider in &self.providers {
            match provider.deleted_entries().await {
                Ok(mut deleted) => entries.append(&mut deleted),
                Err(err) => {
                    warn!(
                        provider = provider.kind(),
                        error = %err,
                        "provider failed while listing deleted entries, skipping"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Drop every provider's session tree cache.
    pub async fn clear_tree_cache(&self) {
        for provider in &self.providers {
            provider.clear_tree_cache().await;
        }
    }

    /// Trash several entries. Paths are processed sequentially in call
    /// order; per-item failures are collected and raised together as one
    /// [`Error::Batch`] once every path has been processed. An unowned
    /// path records `NotFound` and does not stop the batch.
    pub async fn rm_many(&self, paths: &[VPath]) -> Result<()> {
        let mut report = BatchFailureReport::new();
        for path in paths {
            if let Err(err) = self.rm(path).await {
                debug!(path = %path, error = %err, "batch trash failed for item");
                report.push(path.clone(), err);
            }
        }
        report.into_result()
    }

    /// Permanently delete several entries, with the same partial-failure
    /// semantics as [`rm_many`](Self::rm_many).
    pub async fn purge_many(&self, paths: &[VPath]) -> Result<()> {
        let mut report = BatchFailureReport::new();
        for path in paths {
            if let Err(err) = self.purge(path).await {
                debug!(path = %path, error = %err, "batch purge failed for item");
                report.push(path.clone(), err);
            }
        }
        report.into_result()
    }

    /// Restore several trashed entries, with the same partial-failure
    /// semantics as [`rm_many`](Self::rm_many).
    pub async fn restore_many(&self, paths: &[VPath]) -> Result<()> {
        let mut report = BatchFailureReport::new();
        for path in paths {
            if let Err(err) = self.restore(path).await {
                debug!(path = %path, error = %err, "batch restore failed for item");
                report.push(path.clone(), err);
            }
        }
        report.into_result()
    }

    /// Copy several `(source, dest)` pairs. Failures are keyed by the
    /// item's source path; an item whose destination falls outside the
    /// source's provider records `InvalidOperation` like any other
    /// per-item failure.
    pub async fn cp_many(&self, items: &[(VPath, VPath)]) -> Result<()> {
        let mut report = BatchFailureReport::new();
        for (source, dest) in items {
            if let Err(err) = self.cp(source, dest).await {
                debug!(source = %source, dest = %dest, error = %err, "batch copy failed for item");
                report.push(source.clone(), err);
            }
        }
        report.into_result()
    }

    /// Move several `(source, dest)` pairs, with the same semantics as
    /// [`cp_many`](Self::cp_many).
    pub async fn mv_many(&self, items: &[(VPath, VPath)]) -> Result<()> {
        let mut report = BatchFailureReport::new();
        for (source, dest) in items {
            if let Err(err) = self.mv(source, dest).await {
                debug!(source = %source, dest = %dest, error = %err, "batch move failed for item");
                report.push(source.clone(), err);
            }
        }
        report.into_result()
    }

    async fn decorate_tree(&self, tree: &mut Tree, opts: &TreeOptions) {
        if let Err(err) = self.decorator.decorate_tree(self, tree, opts).await {
            warn!(path = %tree.entry.path, error = %err, "tree decoration failed");
        }
    }

    /// The synthetic node representing the federation itself: a plain
    /// folder with a fixed name and provider tag, no capabilities, and a
    /// path no provider owns.
    fn aggregate_root() -> Entry {
        Entry {
            name: AGGREGATE_ROOT_NAME.to_string(),
            path: VPath::aggregate_root(),
            parent: None,
            kind: EntryKind::Folder,
            size: 0,
            content_type: ContentType::none(),
            created: None,
            modified: None,
            deleted: None,
            owner: None,
            capabilities: Capabilities::none(),
            metadata: None,
            provider: AGGREGATE_PROVIDER.to_string(),
            trash: None,
        }
    }
}
