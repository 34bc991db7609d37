//! Prelude for commonly used types and traits in datalens.

pub use crate::analyzers::{
    apply_filters, extract_filters, suggest_filters, ColumnKind, ColumnProfile, ColumnProfiler,
    FilterControl, FilterMatch, ManualFilter, TableProfile,
};
pub use crate::compare::{
    compare_datasets, compare_states, Comparison, DatasetComparison, EmptyReason,
    StateComparison,
};
pub use crate::config::LensConfig;
pub use crate::error::{ErrorContext, LensError, Result};
pub use crate::logging::LogConfig;
pub use crate::preprocess::preprocess;
pub use crate::session::{LoadReport, Session};
pub use crate::sources::{
    DatasetCatalog, DatasetEntry, DatasetKind, FetchError, JsonFileSource, OpenDataClient,
    RecordSource,
};
pub use crate::table::{Table, Value};
