//! # datalens - Exploratory analysis for government open data
//!
//! datalens fetches tabular datasets from an open-data REST API, profiles
//! their columns, turns free-text questions into row filters and compares
//! groups of rows. Aggregation runs on DataFusion over in-memory Arrow
//! batches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use datalens::prelude::*;
//!
//! # async fn example() -> datalens::error::Result<()> {
//! let config = LensConfig::from_env()?;
//! let client = OpenDataClient::new(config.clone())?;
//! let mut session = Session::new(Arc::new(client), config.default_limit());
//!
//! let rainfall = DatasetEntry::new("rainfall", "88a2e56c-8c5c-4d34-a2d1-1b2a7e5c6f7d")
//!     .with_kind(DatasetKind::Rainfall);
//! if let LoadReport::Failed(e) = session.select_dataset(&rainfall).await {
//!     eprintln!("warning: {e}");
//! }
//!
//! for column in session.profile().columns() {
//!     println!("{}: {:?}", column.column_name, column.kind);
//! }
//!
//! match compare_states(session.current_table(), "Maharashtra", "Karnataka", Some(2022)).await? {
//!     Comparison::Rows(table) => println!("{table}"),
//!     Comparison::Empty(reason) => eprintln!("nothing to compare: {reason}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`sources`**: the [`RecordSource`](sources::RecordSource) trait, the
//!   HTTP client, offline JSON files and the dataset catalog
//! - **`table`**: the in-memory [`Table`](table::Table), Arrow conversion and
//!   CSV export
//! - **`preprocess`**: header and value normalization after fetching
//! - **`analyzers`**: column profiling, keyword filter extraction and filter
//!   suggestions
//! - **`compare`**: state and dataset comparisons on DataFusion
//! - **`session`**: per-user state with cached profiles
//!
//! ## Errors
//!
//! Fetch failures are [`FetchError`](sources::FetchError) values that the
//! session turns into warnings. Everything else returns
//! [`LensError`](error::LensError). A comparison with nothing to show is not
//! an error: it returns [`Comparison::Empty`](compare::Comparison::Empty).

pub mod analyzers;
pub mod compare;
pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod preprocess;
pub mod security;
pub mod session;
pub mod sources;
pub mod table;

#[cfg(test)]
mod test_fixtures;
