use indexmap::IndexMap;
use thiserror::Error;

use crate::batch::BatchRequest;
use crate::entry::{Category, SoftwareEntry, SourceDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("an entry named '{0}' already exists")]
    DuplicateName(String),

    #[error("no entry named '{0}'")]
    UnknownEntry(String),

    #[error("entry name must not be empty")]
    EmptyName,
}

/// Which entries an install or listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    Apps,
    Games,
}

impl Scope {
    pub fn contains(&self, category: &Category) -> bool {
        match self {
            Scope::All => true,
            Scope::Apps => *category == Category::App,
            Scope::Games => *category == Category::Game,
        }
    }
}

/// The software database, keyed by name in insertion order.
///
/// New entries are appended; edits replace an entry by its name. Runs take a
/// [`BatchRequest`] snapshot, so the catalog can be edited between runs
/// without aliasing anything a run is iterating over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: IndexMap<String, SoftwareEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a persisted list. Blank names and later duplicates
    /// are left out; [`Document`](crate::document::Document) keeps those rows.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SoftwareEntry>,
    {
        let mut catalog = Self::new();
        for entry in entries {
            if !entry.name.is_empty() && !catalog.entries.contains_key(&entry.name) {
                catalog.entries.insert(entry.name.clone(), entry);
            }
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SoftwareEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoftwareEntry> {
        self.entries.values()
    }

    /// Entries of `scope`, in catalog order.
    pub fn in_scope(&self, scope: Scope) -> impl Iterator<Item = &SoftwareEntry> {
        self.iter().filter(move |e| scope.contains(&e.category))
    }

    /// Append a new entry.
    pub fn add(&mut self, entry: SoftwareEntry) -> Result<(), CatalogError> {
        if entry.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.entries.contains_key(&entry.name) {
            return Err(CatalogError::DuplicateName(entry.name));
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Replace the entry stored under `entry.name`, keeping its position.
    /// Returns the previous value.
    pub fn replace(&mut self, entry: SoftwareEntry) -> Result<SoftwareEntry, CatalogError> {
        match self.entries.get_mut(&entry.name) {
            Some(slot) => Ok(std::mem::replace(slot, entry)),
            None => Err(CatalogError::UnknownEntry(entry.name)),
        }
    }

    /// Replace just the source of `name`.
    pub fn set_source(&mut self, name: &str, source: SourceDescriptor) -> Result<(), CatalogError> {
        let mut entry = self.require(name)?.clone();
        entry.source = source;
        self.replace(entry).map(|_| ())
    }

    /// Replace just the silent args of `name`.
    pub fn set_silent_args(&mut self, name: &str, args: Option<String>) -> Result<(), CatalogError> {
        let entry = self.require(name)?.clone();
        let entry = match args {
            Some(args) => entry.with_silent_args(args),
            None => SoftwareEntry {
                silent_args: None,
                ..entry
            },
        };
        self.replace(entry).map(|_| ())
    }

    /// Remove every named entry. Names are de-duplicated; nothing is removed
    /// unless all of them exist.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<SoftwareEntry>, CatalogError> {
        for name in names {
            self.require(name.as_ref())?;
        }
        Ok(names
            .iter()
            .filter_map(|name| self.entries.shift_remove(name.as_ref()))
            .collect())
    }

    /// Merge `entries` into the catalog. Existing names are skipped unless
    /// `overwrite` is set. Returns how many entries were added or replaced.
    pub fn merge<I>(&mut self, entries: I, overwrite: bool) -> usize
    where
        I: IntoIterator<Item = SoftwareEntry>,
    {
        let mut changed = 0;
        for entry in entries {
            if entry.name.trim().is_empty() {
                continue;
            }
            let exists = self.entries.contains_key(&entry.name);
            if exists && !overwrite {
                continue;
            }
            self.entries.insert(entry.name.clone(), entry);
            changed += 1;
        }
        changed
    }

    /// Build a batch from named entries, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<BatchRequest, CatalogError> {
        let entries = names
            .iter()
            .map(|name| self.require(name.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchRequest::new(entries))
    }

    /// Build a batch from every entry of `scope`.
    pub fn select_scope(&self, scope: Scope) -> BatchRequest {
        BatchRequest::new(self.in_scope(scope).cloned())
    }

    pub fn to_entries(&self) -> Vec<SoftwareEntry> {
        self.entries.values().cloned().collect()
    }

    fn require(&self, name: &str) -> Result<&SoftwareEntry, CatalogError> {
        self.entries
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEntry(name.to_string()))
    }
}
