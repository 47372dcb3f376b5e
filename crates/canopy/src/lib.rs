/**
 * Post-retrieval enrichment pipeline.
 *  Decorators mutate freshly retrieved entries, trees and
 *  metadata in place, isolated from the primary operation's
 *  success or failure.
 */
pub mod decorate;
/**
 * The data model callers see: entries, trees, capability
 *  flags, metadata maps, and the options records that shape
 *  retrievals.
 */
pub mod entry;
/**
 * The shared error taxonomy and the structured report raised
 *  by batch operations.
 */
pub mod error;
/**
 * The aggregator/router: one path-addressable service over an
 *  ordered registry of providers.
 */
pub mod federation;
/**
 * Virtual path value type: absolute (`/a/b`) and connection
 *  (`scheme://a/b`) forms, parsed once, immutable after.
 */
pub mod path;
/**
 * The contract storage backends implement, plus the in-memory
 *  reference backend.
 */
pub mod provider;

pub mod prelude {
    pub use crate::decorate::{CompositeDecorator, Decorator, EntryHook, HookDecorator, NullDecorator};
    pub use crate::entry::{Entry, EntryKind, EntryOptions, Metadata, Tree, TreeFilter, TreeOptions};
    pub use crate::error::{BatchFailureReport, Error, Result};
    pub use crate::federation::Federation;
    pub use crate::path::{PathError, VPath};
    pub use crate::provider::{MemoryProvider, Provider};
}
