use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors raised while parsing a virtual path or deriving one from another.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The input was empty or blank
    #[error("empty path")]
    Empty,
    /// The input is neither rooted at `/` nor scheme-qualified
    #[error("path must be absolute or scheme-qualified: {0:?}")]
    NotAbsolute(String),
    /// The input carried a root but nothing after it (`/`, `s3://`)
    #[error("path has no segments: {0:?}")]
    NoSegments(String),
    /// An interior segment was empty (`/a//b`)
    #[error("empty segment in path: {0:?}")]
    EmptySegment(String),
    /// The scheme of a connection path is not `[A-Za-z][A-Za-z0-9+.-]*`
    #[error("invalid scheme: {0:?}")]
    InvalidScheme(String),
    /// `.` and `..` segments are rejected outright; no normalization is
    /// performed, so a parsed path can never escape its owning subtree
    #[error("relative segment {0:?} is not allowed")]
    RelativeSegment(String),
    /// A derived segment (child name, rename target) is not a valid
    /// single segment
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),
}

/// An immutable, hierarchical virtual path.
///
/// Two addressing forms share this type:
///
/// - absolute paths rooted at `/`, e.g. `/docs/reports/q1.txt`
/// - connection paths for scheme-addressed stores, e.g. `s3://assets/logo.png`
///
/// A parsed path always has at least one segment and every segment is
/// non-empty. Paths are pure values: parsing is the only way to create
/// one from the outside, and [`parent`](Self::parent)/[`child`](Self::child)
/// derive new paths without mutation. Equality, ordering and hashing are
/// structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VPath {
    scheme: Option<String>,
    segments: Vec<String>,
}

impl VPath {
    /// Parse a string into a path, rejecting anything that does not
    /// conform to one of the two addressing forms.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some((scheme, rest)) = input.split_once("://") {
            if !is_valid_scheme(scheme) {
                return Err(PathError::InvalidScheme(input.to_string()));
            }
            let segments = split_segments(rest, input)?;
            Ok(Self {
                scheme: Some(scheme.to_ascii_lowercase()),
                segments,
            })
        } else if let Some(rest) = input.strip_prefix('/') {
            let segments = split_segments(rest, input)?;
            Ok(Self {
                scheme: None,
                segments,
            })
        } else {
            Err(PathError::NotAbsolute(input.to_string()))
        }
    }

    /// Lenient counterpart of [`parse`](Self::parse) for inputs that are
    /// allowed to be absent: a missing or blank string maps to `None`,
    /// anything else must parse.
    pub fn parse_opt(input: Option<&str>) -> Result<Option<Self>, PathError> {
        match input {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => Self::parse(s).map(Some),
        }
    }

    /// The path of the synthetic aggregate root. Displays as `/` and is
    /// deliberately not parseable, which keeps the aggregate root
    /// non-addressable.
    pub(crate) fn aggregate_root() -> Self {
        Self {
            scheme: None,
            segments: Vec::new(),
        }
    }

    /// The scheme of a connection path, `None` for absolute paths.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Whether this is a scheme-qualified connection path.
    pub fn is_connection(&self) -> bool {
        self.scheme.is_some()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The first segment. Empty only for the synthetic aggregate root.
    pub fn first_segment(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    /// The last segment, i.e. the entry name this path addresses.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// The ownership discriminant: the scheme for connection paths, the
    /// first segment otherwise. Providers decide `owns` on this value
    /// alone.
    pub fn root(&self) -> &str {
        match &self.scheme {
            Some(scheme) => scheme.as_str(),
            None => self.first_segment(),
        }
    }

    /// The containing path, or `None` for single-segment paths.
    pub fn parent(&self) -> Option<VPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            scheme: self.scheme.clone(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Derive the path of a direct child. The name must be a single
    /// non-empty segment; this doubles as rename-target validation.
    pub fn child(&self, name: &str) -> Result<VPath, PathError> {
        Self::validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self {
            scheme: self.scheme.clone(),
            segments,
        })
    }

    /// Check that `name` is usable as a single path segment.
    pub fn validate_name(name: &str) -> Result<(), PathError> {
        if name.trim().is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(PathError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Whether `self` is `prefix` or lies below it.
    pub fn starts_with(&self, prefix: &VPath) -> bool {
        self.scheme == prefix.scheme
            && self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Re-root a path below `from` onto `to`. Callers must ensure
    /// `self.starts_with(from)`.
    pub fn rebase(&self, from: &VPath, to: &VPath) -> VPath {
        let mut segments = to.segments.clone();
        segments.extend_from_slice(&self.segments[from.segments.len().min(self.segments.len())..]);
        Self {
            scheme: to.scheme.clone(),
            segments,
        }
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn split_segments(rest: &str, original: &str) -> Result<Vec<String>, PathError> {
    // a single trailing slash is tolerated
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Err(PathError::NoSegments(original.to_string()));
    }
    let mut segments = Vec::new();
    for part in rest.split('/') {
        if part.is_empty() {
            return Err(PathError::EmptySegment(original.to_string()));
        }
        if part == "." || part == ".." {
            return Err(PathError::RelativeSegment(part.to_string()));
        }
        segments.push(part.to_string());
    }
    Ok(segments)
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{}://{}", scheme, self.segments.join("/")),
            None => write!(f, "/{}", self.segments.join("/")),
        }
    }
}

impl FromStr for VPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for VPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for VPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
