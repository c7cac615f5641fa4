//! Namespaced datastore keys.

use core::fmt;

use crate::{DatastoreError, DatastoreResult};

/// A slash-separated datastore key such as `/chunk/ab12`.
///
/// Keys are normalized on construction: a leading `/` is added if missing,
/// repeated separators collapse, and a trailing `/` is dropped. The root key
/// `/` is valid but not used for values by any subsystem.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatastoreKey(String);

impl DatastoreKey {
    /// Build a key from a path, normalizing separators.
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut out = String::with_capacity(path.as_ref().len() + 1);
        for segment in path.as_ref().split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(segment);
        }
        if out.is_empty() {
            out.push('/');
        }
        Self(out)
    }

    /// Build a key, rejecting paths with no segments.
    pub fn parse(path: &str) -> DatastoreResult<Self> {
        let key = Self::new(path);
        if key.is_root() {
            return Err(DatastoreError::InvalidKey {
                key: path.to_owned(),
                reason: "key has no path segments",
            });
        }
        Ok(key)
    }

    /// Append a child segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.0, segment.as_ref()))
    }

    /// Whether this is the root key `/`.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Whether `self` lies under the `prefix` namespace.
    pub fn is_descendant_of(&self, prefix: &DatastoreKey) -> bool {
        prefix.is_root()
            || self
                .0
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatastoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatastoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
