use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::entry::SoftwareEntry;
use crate::settings::Settings;

/// File name of the data document inside the data directory.
pub const DATA_FILE_NAME: &str = "installer_data.json";

/// The persisted application state: `{"settings": {...}, "database": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub database: Vec<SoftwareEntry>,
}

impl Document {
    /// Load the document at `path`.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// parsed is an error, so a later save does not overwrite the user's data.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document: Document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        document
            .settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(document)
    }

    /// Write the document to `path` with four-space indentation, creating
    /// parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, to_pretty_json(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::from_entries(self.database.clone())
    }

    /// Rows the catalog cannot hold: blank names and repeats of an earlier
    /// name, in file order.
    pub fn shadowed_rows(&self) -> Vec<&SoftwareEntry> {
        let mut seen = HashSet::new();
        self.database
            .iter()
            .filter(|entry| entry.name.is_empty() || !seen.insert(entry.name.as_str()))
            .collect()
    }

    /// Replace the database with `catalog`. Shadowed rows are kept after the
    /// catalog's entries, so editing one entry never drops another.
    pub fn set_catalog(&mut self, catalog: &Catalog) {
        let shadowed: Vec<SoftwareEntry> = self.shadowed_rows().into_iter().cloned().collect();
        self.database = catalog.to_entries();
        self.database.extend(shadowed);
    }
}

/// Read a bare entry list, as written by [`export_entries`].
///
/// A full document is accepted too; its database is used.
pub fn import_entries(path: &Path) -> Result<Vec<SoftwareEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Import {
        List(Vec<SoftwareEntry>),
        Document(Document),
    }

    let entries = match serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Import::List(entries) => entries,
        Import::Document(document) => document.database,
    };
    Ok(entries)
}

/// Write `entries` to `path` as a JSON array.
pub fn export_entries(entries: &[SoftwareEntry], path: &Path) -> Result<()> {
    std::fs::write(path, to_pretty_json(&entries)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    out.push(b'\n');
    Ok(out)
}
