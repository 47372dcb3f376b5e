use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;

use crate::entry::{
    Capabilities, Entry, EntryOptions, Metadata, TrashInfo, Tree, TreeFilter, TreeOptions,
};
use crate::error::{Error, Result};
use crate::path::VPath;
use crate::provider::Provider;

/// A live entry: the descriptor, the file payload, and the origin chain
/// accumulated across earlier trash/restore cycles.
#[derive(Debug, Clone)]
struct Record {
    entry: Entry,
    content: Bytes,
    past_origins: Vec<VPath>,
}

/// A trashed subtree: the snapshot taken at removal time plus the
/// removed node stamped with its deletion bookkeeping.
#[derive(Debug, Clone)]
struct TrashRecord {
    records: BTreeMap<VPath, Record>,
    entry: Entry,
}

#[derive(Debug, Default)]
struct State {
    live: BTreeMap<VPath, Record>,
    /// Keyed by the original path. A later deletion at the same path
    /// supersedes an earlier trash entry.
    trash: BTreeMap<VPath, TrashRecord>,
    /// Session tree cache, keyed by normalized retrieval options.
    tree_cache: HashMap<TreeOptions, Tree>,
    /// Paths that behave as nonexistent for this session
    concealed: HashSet<VPath>,
    /// Paths whose content may not be read
    denied: HashSet<VPath>,
}

/// In-memory storage backend implementing the full provider contract.
///
/// Owns either a set of top-level names of the absolute namespace (one
/// provider root per name) or a scheme plus its buckets. Backs the test
/// suite and doubles as the embeddable reference backend; all state
/// lives behind one [`parking_lot::Mutex`], so concurrent federation
/// calls serialize here.
#[derive(Debug)]
pub struct MemoryProvider {
    kind: String,
    name: String,
    scheme: Option<String>,
    roots: Vec<VPath>,
    actor: String,
    state: Mutex<State>,
}

impl MemoryProvider {
    /// A provider owning one or more top-level names, e.g. `["docs"]`
    /// for everything under `/docs`.
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        roots: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let mut root_paths = Vec::new();
        for root in roots {
            let root = root.into();
            root_paths.push(VPath::parse(&format!("/{root}"))?);
        }
        Self::build(kind.into(), name.into(), None, root_paths)
    }

    /// A connection-backed provider owning a whole scheme, with one root
    /// per bucket, e.g. `connection("s3", "Buckets", "s3", ["assets"])`
    /// for everything under `s3://`.
    pub fn connection(
        kind: impl Into<String>,
        name: impl Into<String>,
        scheme: &str,
        buckets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let mut root_paths = Vec::new();
        for bucket in buckets {
            let bucket = bucket.into();
            root_paths.push(VPath::parse(&format!("{scheme}://{bucket}"))?);
        }
        Self::build(
            kind.into(),
            name.into(),
            Some(scheme.to_ascii_lowercase()),
            root_paths,
        )
    }

    fn build(
        kind: String,
        name: String,
        scheme: Option<String>,
        roots: Vec<VPath>,
    ) -> Result<Self> {
        if roots.is_empty() {
            return Err(Error::invalid_operation(
                "a provider requires at least one root",
            ));
        }
        let provider = Self {
            kind,
            name,
            scheme,
            roots,
            actor: "system".to_string(),
            state: Mutex::new(State::default()),
        };
        let now = Utc::now();
        {
            let mut state = provider.state.lock();
            for root in &provider.roots {
                let mut entry = Entry::folder(root.name(), root.clone(), &provider.kind);
                entry.parent = None;
                entry.capabilities = Capabilities {
                    edit: false,
                    delete: false,
                    add_children: true,
                };
                entry.created = Some(now);
                entry.modified = Some(now);
                entry.owner = Some(provider.actor.clone());
                entry.metadata = Some(Metadata::new());
                state.live.insert(
                    root.clone(),
                    Record {
                        entry,
                        content: Bytes::new(),
                        past_origins: Vec::new(),
                    },
                );
            }
        }
        Ok(provider)
    }

    /// Label stamped as owner and deleting user on entries this backend
    /// touches.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Make `path` behave as nonexistent: every operation against it
    /// reports `NotFound`, and it disappears from tree listings.
    pub fn conceal(&self, path: VPath) {
        self.state.lock().concealed.insert(path);
    }

    /// Keep `path` visible but refuse to serve its content.
    pub fn deny_content(&self, path: VPath) {
        self.state.lock().denied.insert(path);
    }

    fn is_root(&self, path: &VPath) -> bool {
        self.roots.contains(path)
    }

    fn require_visible<'a>(state: &'a State, path: &VPath) -> Result<&'a Record> {
        if state.concealed.contains(path) {
            return Err(Error::NotFound(path.clone()));
        }
        state
            .live
            .get(path)
            .ok_or_else(|| Error::NotFound(path.clone()))
    }

    fn require_folder_accepting(state: &State, parent_path: &VPath) -> Result<()> {
        let parent = Self::require_visible(state, parent_path)?;
        if parent.entry.is_file() {
            return Err(Error::invalid_operation(format!(
                "{parent_path} is not a folder"
            )));
        }
        if !parent.entry.can_accept_children() {
            return Err(Error::access_control(format!(
                "{parent_path} does not accept new children"
            )));
        }
        Ok(())
    }

    /// A fresh descriptor for a stored record.
    fn present(record: &Record, include_metadata: bool) -> Entry {
        let mut entry = record.entry.clone();
        if include_metadata {
            if entry.metadata.is_none() {
                entry.metadata = Some(Metadata::new());
            }
        } else {
            entry.metadata = None;
        }
        entry
    }

    /// The base (when live) and every path below it, in store order.
    fn subtree_paths(state: &State, base: &VPath) -> Vec<VPath> {
        state
            .live
            .keys()
            .filter(|path| path.starts_with(base))
            .cloned()
            .collect()
    }

    fn relocate_subtree(state: &mut State, from: &VPath, to: &VPath) {
        for path in Self::subtree_paths(state, from) {
            if let Some(mut record) = state.live.remove(&path) {
                let new_path = path.rebase(from, to);
                record.entry.name = new_path.name().to_string();
                record.entry.parent = new_path.parent();
                record.entry.path = new_path.clone();
                state.live.insert(new_path, record);
            }
        }
    }

    fn validate_transfer(&self, state: &State, source: &VPath, dest: &VPath) -> Result<()> {
        if state.concealed.contains(source) || !state.live.contains_key(source) {
            return Err(Error::NotFound(source.clone()));
        }
        if dest.starts_with(source) {
            return Err(Error::invalid_operation(format!(
                "cannot copy or move {source} into itself"
            )));
        }
        if state.live.contains_key(dest) {
            return Err(Error::Conflict(dest.clone()));
        }
        let parent_path = dest.parent().ok_or_else(|| {
            Error::invalid_operation(format!("cannot create provider root {dest}"))
        })?;
        Self::require_folder_accepting(state, &parent_path)
    }

    fn build_tree(
        state: &State,
        base: &VPath,
        opts: &TreeOptions,
        remaining: Option<u32>,
    ) -> Result<Tree> {
        let record = Self::require_visible(state, base)?;
        let entry = Self::present(record, opts.include_metadata);
        if entry.is_file() || remaining == Some(0) {
            return Ok(Tree::unexpanded(entry));
        }
        let next = remaining.map(|n| n.saturating_sub(1));
        let child_paths: Vec<VPath> = state
            .live
            .values()
            .filter(|r| r.entry.parent.as_ref() == Some(base))
            .map(|r| r.entry.path.clone())
            .collect();
        let mut children = Vec::new();
        for child_path in child_paths {
            let Some(child) = state.live.get(&child_path) else {
                continue;
            };
            if state.concealed.contains(&child_path) {
                continue;
            }
            if !opts.include_hidden && child.entry.name.starts_with('.') {
                continue;
            }
            let keep = match opts.filter {
                TreeFilter::All => true,
                TreeFilter::Folders => child.entry.is_folder(),
                TreeFilter::Files => child.entry.is_file(),
            };
            if !keep {
                continue;
            }
            children.push(Self::build_tree(state, &child_path, opts, next)?);
        }
        Ok(Tree::with_children(entry, children))
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn owns(&self, path: &VPath) -> bool {
        match &self.scheme {
            Some(scheme) => path.scheme() == Some(scheme.as_str()),
            None => {
                path.scheme().is_none()
                    && self
                        .roots
                        .iter()
                        .any(|root| root.first_segment() == path.first_segment())
            }
        }
    }

    async fn tree(&self, opts: &TreeOptions) -> Result<Tree> {
        let base = match &opts.base {
            Some(base) => base.clone(),
            None => self.roots[0].clone(),
        };
        let key = opts.cache_key(base.clone());
        let mut state = self.state.lock();
        if !opts.bypass_cache {
            if let Some(tree) = state.tree_cache.get(&key) {
                // hand out a fresh clone; the cached value is never shared
                return Ok(tree.clone());
            }
        }
        let tree = Self::build_tree(&state, &base, opts, opts.depth)?;
        state.tree_cache.insert(key, tree.clone());
        Ok(tree)
    }

    async fn root_trees(&self, opts: &TreeOptions) -> Result<Vec<Tree>> {
        let state = self.state.lock();
        let mut trees = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            trees.push(Self::build_tree(&state, root, opts, opts.depth)?);
        }
        Ok(trees)
    }

    async fn entry(&self, path: &VPath, opts: &EntryOptions) -> Result<Entry> {
        let state = self.state.lock();
        let record = Self::require_visible(&state, path)?;
        Ok(Self::present(record, opts.include_metadata))
    }

    async fn cat(&self, path: &VPath) -> Result<Bytes> {
        let state = self.state.lock();
        let record = Self::require_visible(&state, path)?;
        if state.denied.contains(path) {
            return Err(Error::ResourceAccessDenied(path.clone()));
        }
        if record.entry.is_folder() {
            return Err(Error::invalid_operation(format!(
                "{path} is a folder and has no content"
            )));
        }
        Ok(record.content.clone())
    }

    async fn mkdir(&self, path: &VPath) -> Result<Entry> {
        let parent_path = path.parent().ok_or_else(|| {
            Error::invalid_operation(format!("cannot create provider root {path}"))
        })?;
        let mut state = self.state.lock();
        if state.live.contains_key(path) {
            return Err(Error::Conflict(path.clone()));
        }
        Self::require_folder_accepting(&state, &parent_path)?;
        let now = Utc::now();
        let mut entry = Entry::folder(path.name(), path.clone(), &self.kind);
        entry.created = Some(now);
        entry.modified = Some(now);
        entry.owner = Some(self.actor.clone());
        entry.metadata = Some(Metadata::new());
        let mut out = entry.clone();
        out.metadata = None;
        state.live.insert(
            path.clone(),
            Record {
                entry,
                content: Bytes::new(),
                past_origins: Vec::new(),
            },
        );
        state.tree_cache.clear();
        Ok(out)
    }

    async fn add(&self, path: &VPath, content: Bytes) -> Result<Entry> {
        let parent_path = path.parent().ok_or_else(|| {
            Error::invalid_operation(format!("cannot create provider root {path}"))
        })?;
        let mut state = self.state.lock();
        if state.live.contains_key(path) {
            return Err(Error::Conflict(path.clone()));
        }
        Self::require_folder_accepting(&state, &parent_path)?;
        let now = Utc::now();
        let mut entry = Entry::file(path.name(), path.clone(), content.len() as u64, &self.kind);
        entry.created = Some(now);
        entry.modified = Some(now);
        entry.owner = Some(self.actor.clone());
        entry.metadata = Some(Metadata::new());
        let mut out = entry.clone();
        out.metadata = None;
        state.live.insert(
            path.clone(),
            Record {
                entry,
                content,
                past_origins: Vec::new(),
            },
        );
        state.tree_cache.clear();
        Ok(out)
    }

    async fn rm(&self, path: &VPath) -> Result<()> {
        let mut state = self.state.lock();
        {
            let record = Self::require_visible(&state, path)?;
            if self.is_root(path) {
                return Err(Error::invalid_operation(format!(
                    "cannot remove provider root {path}"
                )));
            }
            if !record.entry.capabilities.delete {
                return Err(Error::access_control(format!("{path} may not be deleted")));
            }
        }
        let Some(base_record) = state.live.remove(path) else {
            return Err(Error::NotFound(path.clone()));
        };
        let mut tombstone = base_record.entry.clone();
        tombstone.deleted = Some(Utc::now());
        tombstone.metadata = None;
        let mut origins = base_record.past_origins.clone();
        origins.push(path.clone());
        tombstone.trash = Some(TrashInfo {
            origins,
            deleted_by: self.actor.clone(),
        });
        let mut records = BTreeMap::new();
        records.insert(path.clone(), base_record);
        for descendant in Self::subtree_paths(&state, path) {
            if let Some(record) = state.live.remove(&descendant) {
                records.insert(descendant, record);
            }
        }
        state.trash.insert(
            path.clone(),
            TrashRecord {
                records,
                entry: tombstone,
            },
        );
        state.tree_cache.clear();
        Ok(())
    }

    async fn purge(&self, path: &VPath) -> Result<()> {
        let mut state = self.state.lock();
        if state.trash.remove(path).is_some() {
            state.tree_cache.clear();
            return Ok(());
        }
        {
            let record = Self::require_visible(&state, path)?;
            if self.is_root(path) {
                return Err(Error::invalid_operation(format!(
                    "cannot remove provider root {path}"
                )));
            }
            if !record.entry.capabilities.delete {
                return Err(Error::access_control(format!("{path} may not be deleted")));
            }
        }
        state.live.remove(path);
        for descendant in Self::subtree_paths(&state, path) {
            state.live.remove(&descendant);
        }
        state.tree_cache.clear();
        Ok(())
    }

    async fn restore(&self, path: &VPath) -> Result<()> {
        let mut state = self.state.lock();
        if !state.trash.contains_key(path) {
            return Err(Error::NotFound(path.clone()));
        }
        if state.live.contains_key(path) {
            return Err(Error::Conflict(path.clone()));
        }
        if let Some(parent_path) = path.parent() {
            let parent_ok = state
                .live
                .get(&parent_path)
                .map(|r| r.entry.is_folder())
                .unwrap_or(false);
            if !parent_ok {
                return Err(Error::NotFound(parent_path));
            }
        }
        let Some(trashed) = state.trash.remove(path) else {
            return Err(Error::NotFound(path.clone()));
        };
        let origins = trashed
            .entry
            .trash
            .map(|info| info.origins)
            .unwrap_or_default();
        for (record_path, mut record) in trashed.records {
            if record_path == *path {
                record.past_origins = origins.clone();
            }
            state.live.insert(record_path, record);
        }
        state.tree_cache.clear();
        Ok(())
    }

    async fn rename(&self, path: &VPath, new_name: &str) -> Result<Entry> {
        let parent_path = path.parent().ok_or_else(|| {
            Error::invalid_operation(format!("cannot rename provider root {path}"))
        })?;
        let new_path = parent_path.child(new_name)?;
        let mut state = self.state.lock();
        {
            let record = Self::require_visible(&state, path)?;
            if !record.entry.capabilities.edit {
                return Err(Error::access_control(format!("{path} may not be renamed")));
            }
            if new_path == *path {
                return Ok(Self::present(record, false));
            }
        }
        if state.live.contains_key(&new_path) {
            return Err(Error::Conflict(new_path));
        }
        Self::relocate_subtree(&mut state, path, &new_path);
        let entry = match state.live.get_mut(&new_path) {
            Some(record) => {
                record.entry.modified = Some(Utc::now());
                Self::present(record, false)
            }
            None => return Err(Error::NotFound(new_path)),
        };
        state.tree_cache.clear();
        Ok(entry)
    }

    async fn cp(&self, source: &VPath, dest: &VPath) -> Result<()> {
        let mut state = self.state.lock();
        self.validate_transfer(&state, source, dest)?;
        let now = Utc::now();
        for path in Self::subtree_paths(&state, source) {
            if let Some(record) = state.live.get(&path).cloned() {
                let mut copy = record;
                let new_path = path.rebase(source, dest);
                copy.entry.name = new_path.name().to_string();
                copy.entry.parent = new_path.parent();
                copy.entry.path = new_path.clone();
                copy.entry.created = Some(now);
                copy.entry.modified = Some(now);
                copy.entry.owner = Some(self.actor.clone());
                copy.past_origins = Vec::new();
                state.live.insert(new_path, copy);
            }
        }
        state.tree_cache.clear();
        Ok(())
    }

    async fn mv(&self, source: &VPath, dest: &VPath) -> Result<()> {
        let mut state = self.state.lock();
        self.validate_transfer(&state, source, dest)?;
        if self.is_root(source) {
            return Err(Error::invalid_operation(format!(
                "cannot move provider root {source}"
            )));
        }
        Self::relocate_subtree(&mut state, source, dest);
        if let Some(record) = state.live.get_mut(dest) {
            record.entry.modified = Some(Utc::now());
        }
        state.tree_cache.clear();
        Ok(())
    }

    async fn metadata(&self, path: &VPath) -> Result<Metadata> {
        let state = self.state.lock();
        let record = Self::require_visible(&state, path)?;
        Ok(record.entry.metadata.clone().unwrap_or_default())
    }

    async fn set_metadata(&self, path: &VPath, metadata: Metadata) -> Result<()> {
        let mut state = self.state.lock();
        if state.concealed.contains(path) {
            return Err(Error::NotFound(path.clone()));
        }
        let record = state
            .live
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.clone()))?;
        if !record.entry.capabilities.edit {
            return Err(Error::access_control(format!(
                "metadata of {path} may not be changed"
            )));
        }
        record.entry.metadata = Some(metadata);
        record.entry.modified = Some(Utc::now());
        Ok(())
    }

    async fn has_access(&self, path: &VPath) -> Result<bool> {
        let state = self.state.lock();
        Self::require_visible(&state, path)?;
        Ok(!state.denied.contains(path))
    }

    async fn folder_exists(&self, path: &VPath) -> Result<bool> {
        let state = self.state.lock();
        if state.concealed.contains(path) {
            return Ok(false);
        }
        Ok(state
            .live
            .get(path)
            .map(|record| record.entry.is_folder())
            .unwrap_or(false))
    }

    async fn deleted_entries(&self) -> Result<Vec<Entry>> {
        let state = self.state.lock();
        Ok(state
            .trash
            .values()
            .map(|trashed| trashed.entry.clone())
            .collect())
    }

    async fn clear_tree_cache(&self) {
        self.state.lock().tree_cache.clear();
    }
}
