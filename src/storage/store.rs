//! Read-only view of a parsed config file

use std::path::{Path, PathBuf};

use tracing::debug;

use super::limits::Limits;
use super::validator::{check_line_len, for_each_line, preflight};
use crate::domain::{parse, Entry};
use crate::error::Result;

/// Ordered, immutable sequence of entries loaded from one file
///
/// The store is a snapshot: a later [`WriteHandle::set_value`] on the same
/// file is not reflected until the file is loaded again.
///
/// [`WriteHandle::set_value`]: super::WriteHandle::set_value
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl Store {
    /// Loads a file using the default limits
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, &Limits::default())
    }

    /// Loads and parses a file
    ///
    /// Existence, extension and entry count are re-checked first, in that
    /// order. A line longer than `max_line_len` aborts the load.
    pub fn load(path: impl AsRef<Path>, limits: &Limits) -> Result<Self> {
        let path = path.as_ref();
        preflight(path, limits)?;

        let mut entries = Vec::new();
        for_each_line(path, |number, line| {
            check_line_len(number, line, limits)?;
            if let Some(entry) = parse(&String::from_utf8_lossy(line)) {
                entries.push(entry);
            }
            Ok(())
        })?;

        debug!(path = %path.display(), entries = entries.len(), "loaded config");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Builds a store from already-parsed entries
    pub fn from_entries(path: impl Into<PathBuf>, entries: Vec<Entry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    /// Returns the path this store was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Looks up a key's value
    ///
    /// With a category, only pairs under the nearest preceding `[category]`
    /// header match. Without one, the first pair with that key wins wherever
    /// it sits. Pairs before any header belong to no category.
    pub fn lookup(&self, category: Option<&str>, key: &str) -> Option<&str> {
        self.iter()
            .find(|(cat, k, _)| *k == key && (category.is_none() || *cat == category))
            .map(|(_, _, value)| value)
    }

    /// Iterates over `(category, key, value)` for every pair, in file order
    pub fn iter(&self) -> Pairs<'_> {
        Pairs {
            entries: self.entries.iter(),
            current: None,
        }
    }

    /// Returns category names in file order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(Entry::category_name)
    }

    /// Releases the loaded entries
    pub fn release(self) {
        debug!(path = %self.path.display(), entries = self.entries.len(), "released config");
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = (Option<&'a str>, &'a str, &'a str);
    type IntoIter = Pairs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over key-value pairs with their scoping category
pub struct Pairs<'a> {
    entries: std::slice::Iter<'a, Entry>,
    current: Option<&'a str>,
}

impl<'a> Iterator for Pairs<'a> {
    type Item = (Option<&'a str>, &'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            match entry {
                Entry::Category { name } => self.current = Some(name.as_str()),
                Entry::Pair { key, value } => {
                    return Some((self.current, key.as_str(), value.as_str()))
                }
            }
        }
        None
    }
}
