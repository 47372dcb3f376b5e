use async_trait::async_trait;
use bytes::Bytes;

use crate::entry::{Entry, EntryOptions, Metadata, Tree, TreeOptions};
use crate::error::Result;
use crate::path::VPath;

mod memory;

pub use memory::MemoryProvider;

/// The contract every storage backend satisfies to take part in a
/// federation.
///
/// A provider owns a disjoint subset of the path space, advertised
/// through [`owns`](Self::owns), and answers the full operation set for
/// the paths it owns. The federation never talks to a backend any other
/// way. Every fallible operation may raise any member of the shared
/// taxonomy in [`crate::error::Error`]; the federation treats those as
/// opaque and either surfaces them or folds them into aggregate results.
///
/// Concurrency is the provider's concern: several calls may be in flight
/// against the same backend at once, and any shared state (such as a
/// session tree cache) must be serialized internally.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable type identifier, stamped on every entry this backend
    /// produces.
    fn kind(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> &str;

    /// Whether this provider handles `path`. Must be a pure,
    /// side-effect-free function of [`VPath::root`].
    fn owns(&self, path: &VPath) -> bool;

    /// Build the tree at `opts.base`, or the provider's primary root
    /// view when no base is given. Honors depth, filter, hidden and
    /// metadata options; may serve from a session cache unless
    /// `opts.bypass_cache` is set.
    async fn tree(&self, opts: &TreeOptions) -> Result<Tree>;

    /// The trees of every real root this provider exposes, in a stable
    /// order. Any `opts.base` is ignored.
    async fn root_trees(&self, opts: &TreeOptions) -> Result<Vec<Tree>>;

    /// A fresh descriptor for the entry at `path`.
    async fn entry(&self, path: &VPath, opts: &EntryOptions) -> Result<Entry>;

    /// The raw content of the file at `path`.
    ///
    /// # Errors
    /// - `InvalidOperation` when `path` is a folder
    /// - `ResourceAccessDenied` when the caller may not read the content
    async fn cat(&self, path: &VPath) -> Result<Bytes>;

    /// Create a folder at `path`. Invalidates any session tree cache.
    async fn mkdir(&self, path: &VPath) -> Result<Entry>;

    /// Create a file at `path` with the given content.
    async fn add(&self, path: &VPath, content: Bytes) -> Result<Entry>;

    /// Move the entry at `path` (and its subtree) to the trash.
    async fn rm(&self, path: &VPath) -> Result<()>;

    /// Permanently delete the entry at `path`, whether live or trashed.
    async fn purge(&self, path: &VPath) -> Result<()>;

    /// Bring a trashed entry back to its original location.
    ///
    /// # Errors
    /// - `Conflict` when the original location is occupied again
    /// - `NotFound` when nothing was trashed at `path` or the original
    ///   parent folder no longer exists
    async fn restore(&self, path: &VPath) -> Result<()>;

    /// Rename the entry at `path` in place.
    async fn rename(&self, path: &VPath, new_name: &str) -> Result<Entry>;

    /// Copy the entry at `source` (and its subtree) to `dest`.
    async fn cp(&self, source: &VPath, dest: &VPath) -> Result<()>;

    /// Move the entry at `source` (and its subtree) to `dest`.
    async fn mv(&self, source: &VPath, dest: &VPath) -> Result<()>;

    /// The metadata map of the entry at `path`.
    async fn metadata(&self, path: &VPath) -> Result<Metadata>;

    /// Replace the metadata map of the entry at `path`.
    async fn set_metadata(&self, path: &VPath, metadata: Metadata) -> Result<()>;

    /// Whether the caller may access the content at `path`. Paths the
    /// caller may not even see fail with `NotFound` instead.
    async fn has_access(&self, path: &VPath) -> Result<bool>;

    /// Whether a folder currently exists at `path`.
    async fn folder_exists(&self, path: &VPath) -> Result<bool>;

    /// Every trashed entry of this provider, with deletion bookkeeping
    /// attached.
    async fn deleted_entries(&self) -> Result<Vec<Entry>>;

    /// Drop any session-scoped tree cache.
    async fn clear_tree_cache(&self);
}
