//! Per-user working state.
//!
//! A [`Session`] holds the table the user is looking at, its cached profile
//! and the dataset it came from. Loading a dataset replaces the table and
//! drops the profile; asking for the profile computes it once per table.
//! Fetch failures stop here: they become an empty table and a
//! [`LoadReport::Failed`] the caller shows as a warning.
//!
//! Sessions share nothing with each other. Two sessions over the same source
//! fetch independently.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::analyzers::filters::{extract_filters_with_profile, FilterMatch};
use crate::analyzers::profiler::{ColumnProfiler, TableProfile};
use crate::analyzers::suggestions::{suggest_filters, FilterControl};
use crate::preprocess::preprocess;
use crate::sources::{DatasetEntry, FetchError, RecordSource};
use crate::table::Table;

/// What happened when a dataset was loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadReport {
    /// The dataset is loaded with this many rows
    Loaded { rows: usize },
    /// The source answered with no records
    Empty,
    /// The fetch failed; the session now holds an empty table
    Failed(FetchError),
}

impl LoadReport {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadReport::Loaded { .. })
    }
}

/// Working state of one user.
#[derive(Debug)]
pub struct Session {
    source: Arc<dyn RecordSource>,
    profiler: ColumnProfiler,
    default_limit: usize,
    fetch_timeout: Option<Duration>,
    current_table: Table,
    current_profile: Option<TableProfile>,
    last_selected_dataset: Option<DatasetEntry>,
}

impl Session {
    /// Creates a session reading from `source`, fetching `default_limit`
    /// records for datasets without a limit of their own.
    pub fn new(source: Arc<dyn RecordSource>, default_limit: usize) -> Self {
        Self {
            source,
            profiler: ColumnProfiler::new(),
            default_limit,
            fetch_timeout: None,
            current_table: Table::empty(),
            current_profile: None,
            last_selected_dataset: None,
        }
    }

    pub fn with_profiler(mut self, profiler: ColumnProfiler) -> Self {
        self.profiler = profiler;
        self
    }

    /// Bounds each fetch. A fetch that runs longer fails as a network error.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn current_table(&self) -> &Table {
        &self.current_table
    }

    pub fn last_selected_dataset(&self) -> Option<&DatasetEntry> {
        self.last_selected_dataset.as_ref()
    }

    /// True when a profile is cached for the current table.
    pub fn has_cached_profile(&self) -> bool {
        self.current_profile.is_some()
    }

    /// Loads a dataset unless it is the one already loaded.
    ///
    /// Reselecting the loaded dataset keeps the table and its profile and
    /// reports the current row count. A previous load that came back empty
    /// or failed is retried.
    pub async fn select_dataset(&mut self, entry: &DatasetEntry) -> LoadReport {
        let already_loaded = !self.current_table.is_empty()
            && self.last_selected_dataset.as_ref() == Some(entry);
        if already_loaded {
            return LoadReport::Loaded {
                rows: self.current_table.num_rows(),
            };
        }

        self.last_selected_dataset = Some(entry.clone());
        self.load(entry.clone()).await
    }

    /// Fetches the last selected dataset again.
    ///
    /// Without a previous selection there is nothing to reload and the
    /// report is [`LoadReport::Empty`].
    pub async fn reload(&mut self) -> LoadReport {
        match self.last_selected_dataset.clone() {
            Some(entry) => self.load(entry).await,
            None => {
                warn!("Reload requested before any dataset was selected");
                LoadReport::Empty
            }
        }
    }

    /// Drops the table, its profile and the selection.
    pub fn clear(&mut self) {
        self.current_table = Table::empty();
        self.current_profile = None;
        self.last_selected_dataset = None;
    }

    /// The profile of the current table, computed on first use.
    pub fn profile(&mut self) -> &TableProfile {
        let profiler = &self.profiler;
        let table = &self.current_table;
        self.current_profile
            .get_or_insert_with(|| profiler.profile(table))
    }

    /// Filter controls for the current table.
    pub fn suggestions(&mut self) -> Vec<FilterControl> {
        let profiler = &self.profiler;
        let table = &self.current_table;
        let profile = self
            .current_profile
            .get_or_insert_with(|| profiler.profile(table));
        suggest_filters(table, profile)
    }

    /// Extracts keyword filters from a query and applies them to the current
    /// table, reusing the cached profile.
    pub fn query(&mut self, query: &str) -> (FilterMatch, Table) {
        let profiler = &self.profiler;
        let table = &self.current_table;
        let profile = self
            .current_profile
            .get_or_insert_with(|| profiler.profile(table));
        let filters = extract_filters_with_profile(query, table, profile);
        let filtered = filters.apply(table);
        (filters, filtered)
    }

    #[instrument(skip(self, entry), fields(dataset = %entry.name, source = self.source.name()))]
    async fn load(&mut self, entry: DatasetEntry) -> LoadReport {
        let limit = entry.limit.unwrap_or(self.default_limit);
        let source = Arc::clone(&self.source);
        let resource_id = entry.resource_id.clone();
        let timeout = self.fetch_timeout;

        let task = tokio::spawn(async move {
            let fetch = source.fetch(&resource_id, limit);
            match timeout {
                Some(bound) => tokio::time::timeout(bound, fetch).await.unwrap_or_else(|_| {
                    Err(FetchError::Network {
                        message: format!("fetch timed out after {}s", bound.as_secs_f64()),
                    })
                }),
                None => fetch.await,
            }
        });
        let fetched = task.await.unwrap_or_else(|e| {
            Err(FetchError::Network {
                message: format!("fetch task failed: {e}"),
            })
        });

        self.current_profile = None;
        match fetched {
            Ok(table) if table.is_empty() => {
                warn!("Dataset returned no records");
                self.current_table = Table::empty();
                LoadReport::Empty
            }
            Ok(table) => {
                self.current_table = preprocess(table, entry.kind);
                let rows = self.current_table.num_rows();
                info!(rows, "Loaded dataset");
                LoadReport::Loaded { rows }
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Failed to load dataset");
                self.current_table = Table::empty();
                LoadReport::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{parse_envelope, DatasetKind, MemorySource};
    use crate::table::Value;
    use crate::test_fixtures::{rainfall_table, raw_rainfall_body};

    fn session_with(source: &MemorySource) -> Session {
        Session::new(Arc::new(source.clone()), 100)
    }

    #[tokio::test]
    async fn test_reselecting_is_a_noop() {
        let source = MemorySource::new().with_table("rain", rainfall_table());
        let mut session = session_with(&source);
        let entry = DatasetEntry::new("rainfall", "rain");

        assert_eq!(
            session.select_dataset(&entry).await,
            LoadReport::Loaded { rows: 6 }
        );
        session.profile();
        assert!(session.has_cached_profile());

        assert_eq!(
            session.select_dataset(&entry).await,
            LoadReport::Loaded { rows: 6 }
        );
        assert_eq!(source.fetch_count(), 1);
        assert!(session.has_cached_profile());
    }

    #[tokio::test]
    async fn test_new_selection_invalidates_profile() {
        let source = MemorySource::new()
            .with_table("rain", rainfall_table())
            .with_table("raw", parse_envelope(raw_rainfall_body().as_bytes()).unwrap());
        let mut session = session_with(&source);

        session
            .select_dataset(&DatasetEntry::new("rainfall", "rain"))
            .await;
        assert_eq!(session.profile().row_count, 6);

        let raw = DatasetEntry::new("raw", "raw").with_kind(DatasetKind::Rainfall);
        assert!(session.select_dataset(&raw).await.is_loaded());
        assert!(!session.has_cached_profile());
        assert_eq!(session.profile().row_count, 3);
        assert_eq!(
            session.current_table().value(0, "state"),
            Some(&Value::from("Maharashtra"))
        );
        assert_eq!(session.last_selected_dataset(), Some(&raw));
    }

    #[tokio::test]
    async fn test_failure_leaves_empty_table() {
        let source = MemorySource::new().with_table("rain", rainfall_table());
        let mut session = session_with(&source);
        session.select_dataset(&DatasetEntry::new("rainfall", "rain")).await;

        let report = session
            .select_dataset(&DatasetEntry::new("missing", "nope"))
            .await;
        match report {
            LoadReport::Failed(e) => assert_eq!(e.status(), Some(404)),
            other => panic!("unexpected report: {other:?}"),
        }
        assert!(session.current_table().is_empty());
        assert!(session.profile().is_empty());
    }

    #[tokio::test]
    async fn test_reload_and_limits() {
        let source = MemorySource::new().with_table("rain", rainfall_table());
        let mut session = session_with(&source);

        assert_eq!(session.reload().await, LoadReport::Empty);

        let entry = DatasetEntry::new("rainfall", "rain").with_limit(2);
        assert_eq!(
            session.select_dataset(&entry).await,
            LoadReport::Loaded { rows: 2 }
        );
        assert_eq!(session.reload().await, LoadReport::Loaded { rows: 2 });
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_dataset_is_retried() {
        let source = MemorySource::new().with_table("blank", Table::empty());
        let mut session = session_with(&source);
        let entry = DatasetEntry::new("blank", "blank");

        assert_eq!(session.select_dataset(&entry).await, LoadReport::Empty);
        assert_eq!(session.select_dataset(&entry).await, LoadReport::Empty);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_and_query() {
        let source = MemorySource::new().with_table("rain", rainfall_table());
        let mut session = session_with(&source);
        session.select_dataset(&DatasetEntry::new("rainfall", "rain")).await;

        assert!(!session.has_cached_profile());
        let (filters, table) = session.query("how wet was kerala");
        assert!(session.has_cached_profile());
        assert_eq!(filters.get("state"), Some(&Value::from("Kerala")));
        assert_eq!(table.num_rows(), 2);
        assert_eq!(session.suggestions().len(), 3);

        session.clear();
        assert!(session.current_table().is_empty());
        assert!(session.last_selected_dataset().is_none());
        assert!(!session.has_cached_profile());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let source = MemorySource::new().with_table("rain", rainfall_table());
        let mut first = session_with(&source);
        let mut second = session_with(&source);
        let entry = DatasetEntry::new("rainfall", "rain");

        first.select_dataset(&entry).await;
        second.select_dataset(&entry).await;
        first.clear();

        assert_eq!(second.current_table().num_rows(), 6);
        assert_eq!(source.fetch_count(), 2);
    }
}
