//! Plugin location set and the discovery contract.

use std::path::{Path, PathBuf};

use crate::command::CommandFactory;
use crate::error::LocationFailure;

/// Ordered, immutable list of places to search for commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSet {
    paths: Vec<PathBuf>,
}

impl LocationSet {
    /// Creates a location set from paths, keeping their order.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterates over the locations in order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if there are no locations.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Everything a single discovery pass found.
#[derive(Default)]
pub struct Discovery {
    /// Command types in discovery order.
    pub factories: Vec<Box<dyn CommandFactory>>,

    /// Locations that were skipped and why.
    pub failures: Vec<LocationFailure>,
}

/// Finds command types in a set of locations.
///
/// Implementations must rescan on every call so that plugins added or removed
/// between calls are reflected.
pub trait Locator {
    /// Scans `locations` and returns every command type found, together with
    /// the locations that had to be skipped.
    fn discover(&self, locations: &LocationSet) -> Discovery;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_set_keeps_order() {
        let set = LocationSet::new(["b", "a", "c"]);
        let paths: Vec<_> = set.iter().map(|p| p.to_string_lossy().into_owned()).collect();

        assert_eq!(paths, vec!["b", "a", "c"]);
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_location_set() {
        let set = LocationSet::default();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
