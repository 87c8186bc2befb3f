//! Content Records and Catalog Interface
//!
//! The catalog that owns records lives outside this crate; it is reached
//! through [`RecordSource`]. [`InMemoryCatalog`] backs tests and small
//! batches.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::hierarchy::ClassPath;

/// Content item subject to naming validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub class_path: ClassPath,
    /// Full location including the record name; identity for incremental runs
    pub location_path: String,
    /// Container kind when it differs from the validated class, such as
    /// `Blueprint` for a blueprint validated against its native parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_kind: Option<String>,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        class_path: impl Into<ClassPath>,
        location_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            class_path: class_path.into(),
            location_path: location_path.into(),
            asset_kind: None,
        }
    }

    pub fn with_asset_kind(mut self, kind: impl Into<String>) -> Self {
        self.asset_kind = Some(kind.into());
        self
    }

    /// Location without the trailing record segment
    pub fn folder(&self) -> &str {
        self.location_path
            .rsplit_once('/')
            .map_or("", |(folder, _)| folder)
    }
}

/// Supplier of records, typically an asset registry
pub trait RecordSource: Send + Sync {
    /// Every record, produced lazily
    fn records(&self) -> Box<dyn Iterator<Item = Record> + Send + '_>;

    /// Records currently stored at the given locations; missing locations
    /// are omitted
    fn records_at(&self, locations: &HashSet<String>) -> Vec<Record>;
}

/// Catalog held in memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<Record>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Drop the record at `location`, returning it
    pub fn remove(&mut self, location: &str) -> Option<Record> {
        let index = self
            .records
            .iter()
            .position(|record| record.location_path == location)?;
        Some(self.records.remove(index))
    }

    /// Replace the record at the same location, or append it
    pub fn upsert(&mut self, record: Record) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.location_path == record.location_path)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RecordSource for InMemoryCatalog {
    fn records(&self) -> Box<dyn Iterator<Item = Record> + Send + '_> {
        Box::new(self.records.iter().cloned())
    }

    fn records_at(&self, locations: &HashSet<String>) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| locations.contains(&record.location_path))
            .cloned()
            .collect()
    }
}

/// Restricts a run to records under a set of roots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub roots: Vec<String>,
}

impl RecordFilter {
    pub fn new(roots: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `+`-separated root list such as `/Game/Maps+/Game/Props`
    pub fn parse(roots: &str) -> Self {
        Self::new(
            roots.split('+')
                .map(str::trim)
                .filter(|root| !root.is_empty()),
        )
    }

    /// No roots means no restriction
    pub fn is_unrestricted(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn accepts(&self, record: &Record) -> bool {
        self.is_unrestricted()
            || self
                .roots
                .iter()
                .any(|root| is_under(&record.location_path, root))
    }
}

/// True when `path` is `root` or lies below it, comparing whole segments
pub(crate) fn is_under(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return true;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
