use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::sources::{FetchError, FetchResult, RecordSource};
use crate::table::Table;

/// Serves pre-built tables, keyed by resource id.
///
/// Unknown resource ids answer like the API does for a missing resource, with
/// a 404 status. The source counts fetches so callers can check how often a
/// session went upstream.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Table>,
    fetches: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table under a resource id.
    pub fn with_table(mut self, resource_id: impl Into<String>, table: Table) -> Self {
        self.tables.insert(resource_id.into(), table);
        self
    }

    /// Number of `fetch` calls served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch(&self, resource_id: &str, limit: usize) -> FetchResult<Table> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut table = self
            .tables
            .get(resource_id)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                message: format!("unknown resource '{resource_id}'"),
            })?;
        table.truncate(limit);
        Ok(table)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
