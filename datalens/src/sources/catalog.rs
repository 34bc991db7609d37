use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LensError, Result};

/// How a dataset is normalized after fetching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// State/year/rainfall tables
    Rainfall,
    /// Anything else
    #[default]
    Generic,
}

/// A named upstream dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub resource_id: String,
    #[serde(default)]
    pub kind: DatasetKind,
    /// Record limit for this dataset; the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl DatasetEntry {
    pub fn new(name: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_id: resource_id.into(),
            kind: DatasetKind::Generic,
            limit: None,
        }
    }

    pub fn with_kind(mut self, kind: DatasetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Datasets the user can pick by name.
///
/// Catalog files are JSON arrays of entries:
///
/// ```json
/// [
///   {"name": "rainfall", "resource_id": "88a2e56c-...", "kind": "rainfall", "limit": 5000},
///   {"name": "crop_production", "resource_id": "35be999b-..."}
/// ]
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    entries: BTreeMap<String, DatasetEntry>,
}

impl DatasetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON text. Duplicate names are rejected.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<DatasetEntry> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for entry in entries {
            if catalog.entries.contains_key(&entry.name) {
                return Err(LensError::Configuration(format!(
                    "dataset '{}' is listed twice in the catalog",
                    entry.name
                )));
            }
            catalog.register(entry);
        }
        Ok(catalog)
    }

    /// Reads a catalog file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Adds or replaces an entry.
    pub fn register(&mut self, entry: DatasetEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Result<&DatasetEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| LensError::UnknownDataset {
                name: name.to_string(),
            })
    }

    /// Dataset names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
