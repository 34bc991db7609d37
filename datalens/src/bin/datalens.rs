//! datalens command line
//!
//! Loads one dataset (or two, for `compare-datasets`), then profiles,
//! filters or compares it and prints the result. Fetch failures and empty
//! results are warnings and exit successfully; configuration errors and
//! schema mismatches exit with an error.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, warn};

use datalens::analyzers::{extract_filters, suggest_filters, ColumnProfiler};
use datalens::compare::{Comparison, DatasetComparison, StateComparison};
use datalens::config::{LensConfig, DEFAULT_FETCH_LIMIT};
use datalens::error::LensError;
use datalens::logging::setup::{init_logging, LoggingConfig};
use datalens::logging::LogConfig;
use datalens::session::{LoadReport, Session};
use datalens::sources::{
    DatasetCatalog, DatasetEntry, DatasetKind, JsonFileSource, OpenDataClient, RecordSource,
};
use datalens::table::Table;

#[derive(Debug, Parser)]
#[command(name = "datalens", version, about = "Explore government open-data tables")]
struct Cli {
    /// Log debug output from datalens
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and skip per-fetch log lines
    #[arg(long, global = true)]
    quiet: bool,

    /// Tracing filter directives, e.g. "datalens=trace"; `RUST_LOG` wins
    #[arg(long, global = true)]
    log_filter: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Rainfall,
    Generic,
}

impl From<KindArg> for DatasetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Rainfall => DatasetKind::Rainfall,
            KindArg::Generic => DatasetKind::Generic,
        }
    }
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Upstream resource id
    #[arg(long, conflicts_with = "dataset", required_unless_present = "dataset")]
    resource_id: Option<String>,

    /// Dataset name from the catalog
    #[arg(long, requires = "catalog")]
    dataset: Option<String>,

    /// JSON catalog of named datasets
    #[arg(long, env = "DATALENS_CATALOG")]
    catalog: Option<PathBuf>,

    /// How to normalize a dataset given by resource id
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Maximum number of records to fetch
    #[arg(long)]
    limit: Option<usize>,

    /// Read `<resource_id>.json` envelopes from this directory instead of the API
    #[arg(long)]
    offline_dir: Option<PathBuf>,

    /// Also write the result to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Profile every column and suggest filters
    Profile {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Filter rows by values mentioned in a question
    Filter {
        #[command(flatten)]
        source: SourceArgs,

        /// Free-text question, e.g. "rainfall in kerala 2010"
        #[arg(long)]
        query: String,
    },
    /// Compare the average metric of two states
    CompareStates {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        state_a: String,

        #[arg(long)]
        state_b: String,

        #[arg(long)]
        year: Option<i64>,

        #[arg(long, default_value = "state")]
        category_column: String,

        #[arg(long, default_value = "rainfall_mm")]
        metric_column: String,

        #[arg(long, default_value = "year")]
        year_column: String,
    },
    /// Compare metric totals per category across two datasets
    CompareDatasets {
        #[command(flatten)]
        source: SourceArgs,

        /// Resource id of the second dataset
        #[arg(long, conflicts_with = "other_dataset", required_unless_present = "other_dataset")]
        other_resource_id: Option<String>,

        /// Catalog name of the second dataset
        #[arg(long)]
        other_dataset: Option<String>,

        /// Category column; defaults to the first column of the first dataset
        #[arg(long)]
        category: Option<String>,

        /// Metric column; defaults to the first numeric column of the first dataset
        #[arg(long)]
        metric: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::production()
    } else {
        LogConfig::default()
    };
    let mut logging = if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    }
    .with_lens_level(log_config.base_level)
    .with_json_format(cli.json_logs);
    if let Some(filter) = &cli.log_filter {
        logging = logging.with_env_filter(filter.clone());
    }
    if let Err(e) = init_logging(logging) {
        eprintln!("error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, &log_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LensError>() {
                Some(lens) if lens.is_user_facing() => eprintln!("error: {lens}"),
                _ => {
                    error!(error = ?err, "datalens failed");
                    eprintln!("error: {err:#}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, log_config: &LogConfig) -> Result<()> {
    match command {
        Command::Profile { source } => profile(&source, log_config).await,
        Command::Filter { source, query } => filter(&source, &query, log_config).await,
        Command::CompareStates {
            source,
            state_a,
            state_b,
            year,
            category_column,
            metric_column,
            year_column,
        } => {
            let comparison = StateComparison::new()
                .with_category_column(category_column)
                .with_metric_column(metric_column)
                .with_year_column(year_column);
            let entry = source.resource_entry(DatasetKind::Rainfall)?;
            let Some(table) = load(&source, entry, log_config).await? else {
                return Ok(());
            };
            let outcome = comparison.compare(&table, &state_a, &state_b, year).await?;
            report(outcome, source.csv.as_deref())
        }
        Command::CompareDatasets {
            source,
            other_resource_id,
            other_dataset,
            category,
            metric,
        } => {
            let first_entry = source.resource_entry(DatasetKind::Generic)?;
            let second_entry = match (other_resource_id, other_dataset) {
                (Some(id), _) => source.entry_for_id(&id, DatasetKind::Generic),
                (None, Some(name)) => source.catalog_entry(&name)?,
                (None, None) => bail!("--other-resource-id or --other-dataset is required"),
            };

            let Some(first) = load(&source, first_entry, log_config).await? else {
                return Ok(());
            };
            let Some(second) = load(&source, second_entry, log_config).await? else {
                return Ok(());
            };

            let mut comparison = DatasetComparison::new();
            if let Some(column) = category {
                comparison = comparison.with_category_column(column);
            }
            if let Some(column) = metric {
                comparison = comparison.with_metric_column(column);
            }
            let outcome = comparison.compare(&first, &second).await?;
            report(outcome, source.csv.as_deref())
        }
    }
}

impl SourceArgs {
    fn catalog_entry(&self, name: &str) -> Result<DatasetEntry> {
        let path = self
            .catalog
            .as_ref()
            .context("--catalog is required to look up datasets by name")?;
        let catalog = DatasetCatalog::from_json_file(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let entry = catalog.get(name)?.clone();
        Ok(self.apply_limit(entry))
    }

    fn entry_for_id(&self, resource_id: &str, default_kind: DatasetKind) -> DatasetEntry {
        let kind = self.kind.map_or(default_kind, DatasetKind::from);
        self.apply_limit(DatasetEntry::new(resource_id, resource_id).with_kind(kind))
    }

    fn resource_entry(&self, default_kind: DatasetKind) -> Result<DatasetEntry> {
        match (&self.resource_id, &self.dataset) {
            (Some(id), _) => Ok(self.entry_for_id(id, default_kind)),
            (None, Some(name)) => self.catalog_entry(name),
            (None, None) => bail!("--resource-id or --dataset is required"),
        }
    }

    fn apply_limit(&self, entry: DatasetEntry) -> DatasetEntry {
        match self.limit {
            Some(limit) => entry.with_limit(limit),
            None => entry,
        }
    }

    fn record_source(&self, log_config: &LogConfig) -> Result<(Arc<dyn RecordSource>, usize)> {
        if let Some(dir) = &self.offline_dir {
            return Ok((Arc::new(JsonFileSource::new(dir)), DEFAULT_FETCH_LIMIT));
        }
        let config = LensConfig::from_env()?;
        let limit = config.default_limit();
        let client = OpenDataClient::new(config)?.with_log_config(log_config.clone());
        Ok((Arc::new(client), limit))
    }
}

/// Loads a dataset into a fresh session. `None` means there is nothing to
/// work with and a warning was printed.
async fn load(
    source: &SourceArgs,
    entry: DatasetEntry,
    log_config: &LogConfig,
) -> Result<Option<Table>> {
    let (records, default_limit) = source.record_source(log_config)?;
    let mut session = Session::new(records, default_limit);

    match session.select_dataset(&entry).await {
        LoadReport::Loaded { .. } => Ok(Some(session.current_table().clone())),
        LoadReport::Empty => {
            eprintln!("warning: dataset '{}' returned no records", entry.name);
            Ok(None)
        }
        LoadReport::Failed(e) => {
            eprintln!("warning: could not load dataset '{}': {e}", entry.name);
            Ok(None)
        }
    }
}

async fn profile(source: &SourceArgs, log_config: &LogConfig) -> Result<()> {
    let entry = source.resource_entry(DatasetKind::Generic)?;
    let Some(table) = load(source, entry, log_config).await? else {
        return Ok(());
    };

    let profile = ColumnProfiler::new().profile(&table);
    println!("{} rows", profile.row_count);
    for column in profile.columns() {
        let samples: Vec<String> = column.sample_values.iter().map(|v| v.to_string()).collect();
        println!(
            "{:<24} {:?}/{:?} distinct={} missing={} samples=[{}]",
            column.column_name,
            column.data_type,
            column.kind,
            column.distinct_count,
            column.missing_count,
            samples.join(", ")
        );
    }

    println!();
    println!("Suggested filters:");
    for control in suggest_filters(&table, &profile) {
        println!("  {}", serde_json::to_string(&control)?);
    }

    if let Some(path) = &source.csv {
        write_csv(&table, path)?;
    }
    Ok(())
}

async fn filter(source: &SourceArgs, query: &str, log_config: &LogConfig) -> Result<()> {
    let entry = source.resource_entry(DatasetKind::Generic)?;
    let Some(table) = load(source, entry, log_config).await? else {
        return Ok(());
    };

    let filters = extract_filters(query, &table);
    if filters.is_empty() {
        eprintln!("note: no column values found in the query; showing all rows");
    } else {
        for (column, value) in filters.iter() {
            println!("{column} = {value}");
        }
    }

    let filtered = filters.apply(&table);
    println!("{filtered}");
    if let Some(path) = &source.csv {
        write_csv(&filtered, path)?;
    }
    Ok(())
}

fn report(outcome: Comparison, csv: Option<&Path>) -> Result<()> {
    match outcome {
        Comparison::Rows(table) => {
            println!("{table}");
            if let Some(path) = csv {
                write_csv(&table, path)?;
            }
        }
        Comparison::Empty(reason) => {
            warn!(%reason, "Comparison produced no rows");
            eprintln!("warning: nothing to compare: {reason}");
        }
    }
    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    table.write_csv(file)?;
    eprintln!("wrote {} rows to {}", table.num_rows(), path.display());
    Ok(())
}
