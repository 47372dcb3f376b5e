use serde::{Deserialize, Serialize};

use crate::path::VPath;

/// Which entry kinds a tree retrieval keeps as children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeFilter {
    /// Keep files and folders
    #[default]
    All,
    /// Keep the folder skeleton only (navigation-pane view)
    Folders,
    /// Keep direct file children only; folders are not descended
    Files,
}

/// Configuration record for tree retrieval.
///
/// Plain value object: copyable, compared by value, usable as a provider
/// cache key once normalized through [`cache_key`](Self::cache_key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeOptions {
    /// Node to build the tree from; `None` asks for the root view
    pub base: Option<VPath>,
    /// How many levels below the base to expand; `None` is unlimited.
    /// Folders at the frontier are left unfetched (`children: None`).
    pub depth: Option<u32>,
    pub filter: TreeFilter,
    /// Include entries whose name starts with `.`
    pub include_hidden: bool,
    /// Attach the metadata map to every returned entry
    pub include_metadata: bool,
    /// Skip any provider-side tree cache for this call
    pub bypass_cache: bool,
}

impl TreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options rooted at `base`.
    pub fn at(base: VPath) -> Self {
        Self {
            base: Some(base),
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_filter(mut self, filter: TreeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }

    pub fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// Normalize for use as a cache key: the bypass flag selects whether
    /// a cache is consulted and is not part of the cached shape itself.
    pub fn cache_key(&self, resolved_base: VPath) -> Self {
        Self {
            base: Some(resolved_base),
            bypass_cache: false,
            ..self.clone()
        }
    }
}

/// Configuration record for single-entry retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Attach the metadata map to the returned entry
    pub include_metadata: bool,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}
