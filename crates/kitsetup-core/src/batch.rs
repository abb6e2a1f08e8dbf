use std::collections::HashSet;

use thiserror::Error;

use crate::entry::SoftwareEntry;
use crate::executor::ExecError;
use crate::resolver::ResolveError;

/// An ordered, de-duplicated list of installable entries for one run.
///
/// The only constructor drops ineligible entries (unknown or empty source)
/// and repeated names (first occurrence wins), so the runner never sees them.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    items: Vec<SoftwareEntry>,
}

impl BatchRequest {
    pub fn new<I>(selection: I) -> Self
    where
        I: IntoIterator<Item = SoftwareEntry>,
    {
        let mut seen = HashSet::new();
        let items = selection
            .into_iter()
            .filter(|entry| entry.is_installable())
            .filter(|entry| seen.insert(entry.name.clone()))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[SoftwareEntry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why a single item failed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// The item that stopped the batch.
#[derive(Debug)]
pub struct FailedItem {
    pub name: String,
    pub error: ItemError,
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Items whose resolution was started
    pub attempted: usize,
    /// Items that resolved and installed successfully
    pub succeeded: usize,
    /// First failure, after which the run stopped
    pub failed_item: Option<FailedItem>,
    /// Whether the run was stopped by its cancellation token
    pub cancelled: bool,
}

impl BatchResult {
    /// Whether every requested item installed.
    pub fn is_success(&self) -> bool {
        self.failed_item.is_none() && !self.cancelled
    }
}
