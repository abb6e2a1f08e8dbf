use std::path::{Path, PathBuf};

use anyhow::Result;

use kitsetup_core::catalog::Catalog;
use kitsetup_core::document::Document;

/// The loaded data document and where it lives.
pub struct Store {
    path: PathBuf,
    pub document: Document,
}

impl Store {
    pub fn load(path: &Path) -> Result<Self> {
        let document = Document::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> Catalog {
        self.document.catalog()
    }

    /// Replace the database with `catalog` and write the document.
    pub fn commit(&mut self, catalog: &Catalog) -> Result<()> {
        self.document.set_catalog(catalog);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "saving data file");
        self.document.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitsetup_core::entry::{Category, SoftwareEntry};
    use tempfile::TempDir;

    #[test]
    fn test_commit_persists_catalog() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("data.json");

        let mut store = Store::load(&path).expect("load");
        let mut catalog = store.catalog();
        catalog
            .add(SoftwareEntry::new("Foo", Category::App))
            .expect("add");
        store.commit(&catalog).expect("commit");

        let reloaded = Store::load(&path).expect("reload");
        assert!(reloaded.catalog().contains("Foo"));
        assert_eq!(reloaded.path(), path.as_path());
    }
}
