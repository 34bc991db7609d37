//! Record sources: where tables come from.
//!
//! Every source answers `fetch(resource_id, limit)` with a [`Table`] or a
//! [`FetchError`]. The HTTP client talks to the open-data API; the file and
//! memory sources serve the same envelopes offline.
//!
//! Upstream responses are JSON envelopes of the form
//! `{"records": [{"column": value, ...}, ...]}`.

use std::fmt::Debug;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::table::Table;

mod catalog;
mod error;
mod file;
mod http;
mod memory;

pub use catalog::{DatasetCatalog, DatasetEntry, DatasetKind};
pub use error::{FetchError, FetchResult};
pub use file::JsonFileSource;
pub use http::OpenDataClient;
pub use memory::MemorySource;

/// A source of tabular records addressed by resource id.
///
/// Implementations perform at most one upstream call per `fetch` and never
/// cache results across calls.
#[async_trait]
pub trait RecordSource: Debug + Send + Sync {
    /// Fetches up to `limit` records of a resource.
    async fn fetch(&self, resource_id: &str, limit: usize) -> FetchResult<Table>;

    /// Short name of this source for logging.
    fn name(&self) -> &str;
}

#[derive(Deserialize)]
struct Envelope {
    records: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Parses a JSON envelope body into a table.
///
/// The body must be a JSON object with a `records` array of objects.
///
/// ```rust
/// use datalens::sources::parse_envelope;
///
/// let table = parse_envelope(br#"{"records": [{"state": "Goa", "year": 2019}]}"#).unwrap();
/// assert_eq!(table.num_rows(), 1);
/// assert!(parse_envelope(br#"{"status": "ok"}"#).is_err());
/// ```
pub fn parse_envelope(body: &[u8]) -> FetchResult<Table> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| FetchError::parse(format!("invalid records envelope: {e}")))?;
    Ok(Table::from_json_records(&envelope.records))
}

/// Rejects resource ids that could escape the URL path or file name.
pub(crate) fn validate_resource_id(resource_id: &str) -> FetchResult<()> {
    static RESOURCE_ID: Lazy<Regex> = Lazy::new(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[A-Za-z0-9_-]+$").expect("Hard-coded regex pattern should be valid")
    });

    if RESOURCE_ID.is_match(resource_id) {
        Ok(())
    } else {
        Err(FetchError::InvalidRequest {
            message: format!(
                "resource id '{resource_id}' must be non-empty and contain only letters, digits, '-' or '_'"
            ),
        })
    }
}
