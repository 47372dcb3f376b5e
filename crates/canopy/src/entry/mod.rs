use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::VPath;

mod content_type;
mod options;

pub use content_type::ContentType;
pub use options::{EntryOptions, TreeFilter, TreeOptions};

/// Key/value metadata attached to an entry. The federation never
/// interprets values; ordering is deterministic.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// What the caller is allowed to do with an entry, as reported by the
/// provider that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub edit: bool,
    pub delete: bool,
    /// Folders only: whether new children may be created underneath
    pub add_children: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            edit: true,
            delete: true,
            add_children: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Deletion bookkeeping carried by trashed entries only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashInfo {
    /// The locations the entry lived at when it was deleted, oldest
    /// first; the last one is where a restore puts it back.
    pub origins: Vec<VPath>,
    /// Who deleted it
    pub deleted_by: String,
}

/// A file or folder as seen through the federation.
///
/// Entries are produced fresh on every retrieval and are safe to mutate
/// by decoration; only whole trees may be cached, and only by the
/// provider that built them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    /// The physical path of the entry
    pub path: VPath,
    /// `None` only for provider roots and the synthetic aggregate root
    pub parent: Option<VPath>,
    pub kind: EntryKind,
    pub size: u64,
    #[serde(default)]
    pub content_type: ContentType,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Set while the entry sits in the trash
    pub deleted: Option<DateTime<Utc>>,
    pub owner: Option<String>,
    pub capabilities: Capabilities,
    /// `None` when metadata was not requested or not loaded; an empty
    /// map means loaded-and-empty
    pub metadata: Option<Metadata>,
    /// Type tag of the backend that produced this entry
    pub provider: String,
    pub trash: Option<TrashInfo>,
}

impl Entry {
    /// A folder descriptor with full capabilities; the parent is derived
    /// from the path. Timestamps and ownership are left for the
    /// producing backend to stamp.
    pub fn folder(name: impl Into<String>, path: VPath, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: path.parent(),
            path,
            kind: EntryKind::Folder,
            size: 0,
            content_type: ContentType::none(),
            created: None,
            modified: None,
            deleted: None,
            owner: None,
            capabilities: Capabilities::all(),
            metadata: None,
            provider: provider.into(),
            trash: None,
        }
    }

    /// A file descriptor with full capabilities and a MIME type guessed
    /// from the name.
    pub fn file(
        name: impl Into<String>,
        path: VPath,
        size: u64,
        provider: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            content_type: ContentType::guess(&name),
            name,
            parent: path.parent(),
            path,
            kind: EntryKind::File,
            size,
            created: None,
            modified: None,
            deleted: None,
            owner: None,
            capabilities: Capabilities::all(),
            metadata: None,
            provider: provider.into(),
            trash: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Whether this entry can currently accept new children.
    pub fn can_accept_children(&self) -> bool {
        self.is_folder() && self.capabilities.add_children
    }

    pub fn is_trashed(&self) -> bool {
        self.trash.is_some()
    }

    pub fn metadata_mut(&mut self) -> Option<&mut Metadata> {
        self.metadata.as_mut()
    }
}

/// An entry plus the fetched part of its subtree.
///
/// `children: None` means "not fetched / not expanded"; an empty vec
/// means "fetched, no children". The base node of a retrieval is always
/// depth 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub entry: Entry,
    pub children: Option<Vec<Tree>>,
}

impl Tree {
    /// A node whose children have not been fetched.
    pub fn unexpanded(entry: Entry) -> Self {
        Self {
            entry,
            children: None,
        }
    }

    pub fn with_children(entry: Entry, children: Vec<Tree>) -> Self {
        Self {
            entry,
            children: Some(children),
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// Find the direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Tree> {
        self.children
            .as_ref()?
            .iter()
            .find(|child| child.entry.name == name)
    }

    /// Depth of the deepest fetched node, counting the base as 0.
    pub fn depth(&self) -> usize {
        match &self.children {
            None => 0,
            Some(children) => children
                .iter()
                .map(|child| child.depth() + 1)
                .max()
                .unwrap_or(0),
        }
    }
}
