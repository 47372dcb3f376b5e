//! Post-retrieval enrichment hooks.
//!
//! A decorator mutates freshly produced entries, trees and metadata maps
//! in place after a successful retrieval, and may consult the federation
//! it is registered on to fetch auxiliary data. Decoration is best
//! effort: the federation catches and logs whatever a decorator raises,
//! so enrichment can never fail the primary operation.
//!
//! # Built-in decorators
//!
//! - **[`NullDecorator`]**: does nothing; the default when no enrichment
//!   is configured
//! - **[`CompositeDecorator`]**: fans every hook out to its children in
//!   registration order, isolating them from each other's failures
//! - **[`HookDecorator`]**: adapts an [`EntryHook`] into a full
//!   decorator — per-entry enrichment, metadata gating, and a pre-order
//!   tree walk

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

use crate::entry::{Entry, EntryOptions, Metadata, Tree, TreeOptions};
use crate::error::{Error, Result};
use crate::federation::Federation;
use crate::path::VPath;

/// The decoration contract invoked by the federation after every
/// successful retrieval-style operation.
///
/// Hooks mutate their argument in place. The values handed in are owned
/// and freshly constructed, never cached or shared instances, so
/// mutation is safe; they must not be reused concurrently.
#[async_trait]
pub trait Decorator: Send + Sync {
    /// Enrich a single retrieved entry.
    async fn decorate_entry(
        &self,
        federation: &Federation,
        entry: &mut Entry,
        opts: &EntryOptions,
    ) -> Result<()>;

    /// Enrich a retrieved metadata map.
    async fn decorate_metadata(
        &self,
        federation: &Federation,
        path: &VPath,
        metadata: &mut Metadata,
    ) -> Result<()>;

    /// Enrich a retrieved tree.
    async fn decorate_tree(
        &self,
        federation: &Federation,
        tree: &mut Tree,
        opts: &TreeOptions,
    ) -> Result<()>;
}

/// The do-nothing decorator. Never fails, never touches its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDecorator;

impl NullDecorator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Decorator for NullDecorator {
    async fn decorate_entry(
        &self,
        _federation: &Federation,
        _entry: &mut Entry,
        _opts: &EntryOptions,
    ) -> Result<()> {
        Ok(())
    }

    async fn decorate_metadata(
        &self,
        _federation: &Federation,
        _path: &VPath,
        _metadata: &mut Metadata,
    ) -> Result<()> {
        Ok(())
    }

    async fn decorate_tree(
        &self,
        _federation: &Federation,
        _tree: &mut Tree,
        _opts: &TreeOptions,
    ) -> Result<()> {
        Ok(())
    }
}

/// Runs several decorators as one.
///
/// Children run in registration order for every hook. A failing child is
/// logged and skipped; the remaining children still run, so one
/// decorator can never block another's enrichment. The composite itself
/// therefore never fails.
pub struct CompositeDecorator {
    children: Vec<Arc<dyn Decorator>>,
}

impl CompositeDecorator {
    /// Requires at least one child decorator.
    pub fn new(children: Vec<Arc<dyn Decorator>>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::invalid_operation(
                "a composite decorator requires at least one child",
            ));
        }
        Ok(Self { children })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[async_trait]
impl Decorator for CompositeDecorator {
    async fn decorate_entry(
        &self,
        federation: &Federation,
        entry: &mut Entry,
        opts: &EntryOptions,
    ) -> Result<()> {
        for child in &self.children {
            if let Err(err) = child.decorate_entry(federation, entry, opts).await {
                warn!(path = %entry.path, error = %err, "entry decorator failed, running remaining decorators");
            }
        }
        Ok(())
    }

    async fn decorate_metadata(
        &self,
        federation: &Federation,
        path: &VPath,
        metadata: &mut Metadata,
    ) -> Result<()> {
        for child in &self.children {
            if let Err(err) = child.decorate_metadata(federation, path, metadata).await {
                warn!(path = %path, error = %err, "metadata decorator failed, running remaining decorators");
            }
        }
        Ok(())
    }

    async fn decorate_tree(
        &self,
        federation: &Federation,
        tree: &mut Tree,
        opts: &TreeOptions,
    ) -> Result<()> {
        for child in &self.children {
            if let Err(err) = child.decorate_tree(federation, tree, opts).await {
                warn!(path = %tree.entry.path, error = %err, "tree decorator failed, running remaining decorators");
            }
        }
        Ok(())
    }
}

/// Per-entry enrichment logic, adapted into a full [`Decorator`] by
/// [`HookDecorator`]. Implement this to write a decorator without
/// repeating the traversal and gating plumbing.
#[async_trait]
pub trait EntryHook: Send + Sync {
    /// Enrich one entry.
    async fn entry_hook(&self, federation: &Federation, entry: &mut Entry) -> Result<()>;

    /// Enrich one metadata map. Defaults to a no-op.
    async fn metadata_hook(
        &self,
        federation: &Federation,
        path: &VPath,
        metadata: &mut Metadata,
    ) -> Result<()> {
        let _ = (federation, path, metadata);
        Ok(())
    }
}

/// Adapter turning an [`EntryHook`] into a [`Decorator`].
///
/// `decorate_entry` runs the entry hook first and then, only when the
/// caller asked for metadata and the entry carries a map, the metadata
/// hook against the entry's own map. `decorate_tree` walks the tree in
/// pre-order, applying the same per-node decoration; a node failure
/// abandons the walk and propagates out of `decorate_tree` itself —
/// fault isolation across decorators belongs to [`CompositeDecorator`],
/// not to the walk.
pub struct HookDecorator<H> {
    hook: H,
}

impl<H: EntryHook> HookDecorator<H> {
    pub fn new(hook: H) -> Self {
        Self { hook }
    }

    fn walk<'a>(
        &'a self,
        federation: &'a Federation,
        tree: &'a mut Tree,
        opts: &'a EntryOptions,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.decorate_entry(federation, &mut tree.entry, opts).await?;
            if let Some(children) = tree.children.as_mut() {
                for child in children {
                    self.walk(federation, child, opts).await?;
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl<H: EntryHook> Decorator for HookDecorator<H> {
    async fn decorate_entry(
        &self,
        federation: &Federation,
        entry: &mut Entry,
        opts: &EntryOptions,
    ) -> Result<()> {
        self.hook.entry_hook(federation, entry).await?;
        if opts.include_metadata {
            let path = entry.path.clone();
            if let Some(metadata) = entry.metadata_mut() {
                self.hook.metadata_hook(federation, &path, metadata).await?;
            }
        }
        Ok(())
    }

    async fn decorate_metadata(
        &self,
        federation: &Federation,
        path: &VPath,
        metadata: &mut Metadata,
    ) -> Result<()> {
        self.hook.metadata_hook(federation, path, metadata).await
    }

    async fn decorate_tree(
        &self,
        federation: &Federation,
        tree: &mut Tree,
        opts: &TreeOptions,
    ) -> Result<()> {
        let entry_opts = EntryOptions {
            include_metadata: opts.include_metadata,
        };
        self.walk(federation, tree, &entry_opts).await
    }
}
