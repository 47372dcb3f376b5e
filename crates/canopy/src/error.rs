use std::fmt;

use crate::path::{PathError, VPath};

pub type Result<T> = std::result::Result<T, Error>;

/// The shared error taxonomy. Providers raise these, the federation
/// relays them unchanged for single-path operations and folds them into
/// [`Error::Batch`] for batch entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path does not exist, is not the expected kind, or is hidden
    /// from the caller. Concealed-by-policy paths deliberately produce
    /// this same variant so that existence is never leaked to callers
    /// who may not see them.
    #[error("not found: {0}")]
    NotFound(VPath),
    /// The caller may not perform this operation at all
    #[error("access denied: {0}")]
    AccessControl(String),
    /// The caller may know the path exists but may not read its content
    #[error("access to resource denied: {0}")]
    ResourceAccessDenied(VPath),
    /// Malformed path syntax or a structurally invalid target, e.g. an
    /// invalid new name during a rename
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    /// The operation is not meaningful for this path or state, e.g.
    /// requesting the content of a folder
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The target of a copy, move, rename or create already exists
    #[error("conflict: {0} already exists")]
    Conflict(VPath),
    /// One or more items of a batch operation failed; the report carries
    /// every per-item failure in call order
    #[error(transparent)]
    Batch(#[from] BatchFailureReport),
    /// An opaque provider-internal failure
    #[error("provider error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub fn access_control(message: impl Into<String>) -> Self {
        Self::AccessControl(message.into())
    }
}

/// Ordered collection of per-item batch failures.
///
/// Batch operations never abort on the first error; every path is
/// processed and every failure is recorded here, keyed by the offending
/// path, in call order. The report is itself the error raised by the
/// batch entry points when it is non-empty.
#[derive(Debug, Default)]
pub struct BatchFailureReport {
    failures: Vec<(VPath, Error)>,
}

impl BatchFailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `path`.
    pub fn push(&mut self, path: VPath, error: Error) {
        self.failures.push((path, error));
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The first recorded failure for `path`, if any.
    pub fn get(&self, path: &VPath) -> Option<&Error> {
        self.failures
            .iter()
            .find(|(failed, _)| failed == path)
            .map(|(_, error)| error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(VPath, Error)> {
        self.failures.iter()
    }

    /// The failed paths, in call order.
    pub fn paths(&self) -> impl Iterator<Item = &VPath> {
        self.failures.iter().map(|(path, _)| path)
    }

    pub fn into_failures(self) -> Vec<(VPath, Error)> {
        self.failures
    }

    /// Collapse the report: `Ok(())` when nothing failed, otherwise the
    /// batch error carrying this report.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Batch(self))
        }
    }
}

impl fmt::Display for BatchFailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch operation failed for {} item(s)", self.failures.len())?;
        for (path, error) in &self.failures {
            write!(f, "\n  {path}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchFailureReport {}
