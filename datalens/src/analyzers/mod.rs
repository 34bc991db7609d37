//! Table analysis: column profiling, filter extraction and filter suggestions.
//!
//! The [`ColumnProfiler`] produces a [`TableProfile`] that the rest of the
//! crate dispatches on. [`extract_filters`] reads equality filters out of a
//! free-text query, and [`suggest_filters`] proposes a manual control for each
//! profiled column.

pub mod filters;
pub mod profiler;
pub mod suggestions;

pub use filters::{
    apply_filters, extract_filters, extract_filters_with_profile, FilterMatch, ManualFilter,
    Predicate,
};
pub use profiler::{
    ColumnKind, ColumnProfile, ColumnProfiler, ColumnProfilerBuilder, DetectedDataType,
    NumericRange, ProfilerConfig, TableProfile,
};
pub use suggestions::{suggest_filters, FilterControl};
