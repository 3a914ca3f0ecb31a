//! Paths addressing one location in both the schema tree and the model tree.
//!
//! A [`Path`] is an ordered list of [`PathKey`]s: field names for mappings,
//! indices for sequences. It renders as an RFC 6901 JSON Pointer
//! (`/motors/0/pid~1gain`) and parses back from one, which is the form the
//! WASM and CLI surfaces exchange.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormError;

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a single path segment per RFC 6901.
///
/// Order matters: `~1` is unescaped before `~0` so `~01` decodes to `~1`.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

// ---------------------------------------------------------------------------
// PathKey
// ---------------------------------------------------------------------------

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKey {
    /// A mapping key.
    Field(String),
    /// A sequence index.
    Index(usize),
}

impl PathKey {
    /// The key as a sequence index. Numeric field names count, so a path
    /// parsed from text can still address array elements.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(index) => Some(*index),
            PathKey::Field(name) => name.parse().ok(),
        }
    }

    /// The key as a mapping key. Indices render as their decimal string.
    pub fn as_field(&self) -> Cow<'_, str> {
        match self {
            PathKey::Field(name) => Cow::Borrowed(name),
            PathKey::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    fn from_segment(segment: &str) -> Self {
        // Array indices per RFC 6901: "0", or digits without a leading zero.
        let is_index = !segment.is_empty()
            && segment.bytes().all(|b| b.is_ascii_digit())
            && (segment == "0" || !segment.starts_with('0'));
        match segment.parse::<usize>() {
            Ok(index) if is_index => PathKey::Index(index),
            _ => PathKey::Field(unescape_pointer_segment(segment).into_owned()),
        }
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Field(name.to_string())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Field(name)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Field(name) => f.write_str(&escape_pointer_segment(name)),
            PathKey::Index(index) => write!(f, "{index}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered key sequence. Two paths are equal iff their keys are equal
/// element-wise. The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<PathKey>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathKey> {
        self.0.last()
    }

    /// A new path one key deeper.
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend(self.0.iter().cloned());
        keys.push(key.into());
        Self(keys)
    }

    pub fn push(&mut self, key: impl Into<PathKey>) {
        self.0.push(key.into());
    }

    pub fn pop(&mut self) -> Option<PathKey> {
        self.0.pop()
    }

    /// The path without its last key, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parent)| Self(parent.to_vec()))
    }

    /// Whether `prefix` is an ancestor of (or equal to) this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// A copy of this path with the key at `position` replaced.
    pub fn with_key_at(&self, position: usize, key: PathKey) -> Self {
        let mut keys = self.0.clone();
        if let Some(slot) = keys.get_mut(position) {
            *slot = key;
        }
        Self(keys)
    }

    /// Parse an RFC 6901 JSON Pointer, with or without a leading `#`.
    ///
    /// # Example
    /// ```
    /// use jsonschema_form_core::{Path, PathKey};
    /// let path = Path::from_pointer("#/motors/0/pid~1gain").unwrap();
    /// assert_eq!(
    ///     path.keys(),
    ///     &[PathKey::from("motors"), PathKey::Index(0), PathKey::from("pid/gain")]
    /// );
    /// assert!(Path::from_pointer("").unwrap().is_root());
    /// ```
    pub fn from_pointer(pointer: &str) -> Result<Self, FormError> {
        let stripped = pointer.strip_prefix('#').unwrap_or(pointer);
        if stripped.is_empty() {
            return Ok(Self::root());
        }
        let Some(body) = stripped.strip_prefix('/') else {
            return Err(FormError::InvalidPointer {
                pointer: pointer.to_string(),
                message: "must be empty or start with '/'".to_string(),
            });
        };
        Ok(Self(body.split('/').map(PathKey::from_segment).collect()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_pointer(s)
    }
}

impl<K: Into<PathKey>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pointer = String::deserialize(deserializer)?;
        Self::from_pointer(&pointer).map_err(serde::de::Error::custom)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
