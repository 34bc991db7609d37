use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::LensConfig;
use crate::error::{LensError, Result};
use crate::log_data_op;
use crate::logging::{truncate_field, LogConfig};
use crate::sources::{parse_envelope, validate_resource_id, FetchError, FetchResult, RecordSource};
use crate::table::Table;

/// HTTP client for the open-data resource API.
///
/// Issues `GET <base>/<resource_id>?api-key=<key>&format=json&limit=<n>` with
/// the configured timeout. One request per fetch: no retries, no paging.
#[derive(Debug, Clone)]
pub struct OpenDataClient {
    config: Arc<LensConfig>,
    client: Client,
    log_config: LogConfig,
}

impl OpenDataClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LensConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                LensError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config: Arc::new(config),
            client,
            log_config: LogConfig::default(),
        })
    }

    /// Replace the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    /// The endpoint for a resource, without query parameters.
    pub fn resource_url(&self, resource_id: &str) -> String {
        format!("{}/{}", self.config.base_url(), resource_id)
    }

    /// Fetch up to `limit` records of a resource.
    #[instrument(skip(self))]
    pub async fn fetch_records(&self, resource_id: &str, limit: usize) -> FetchResult<Table> {
        validate_resource_id(resource_id)?;
        let url = self.resource_url(resource_id);
        let limit_param = limit.to_string();

        debug!(url = %url, "Requesting resource");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api-key", self.config.api_key().expose()),
                ("format", "json"),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: truncate_field(body.trim(), self.log_config.max_field_length),
            });
        }

        let body = response.bytes().await.map_err(network_error)?;
        let table = parse_envelope(&body)?;

        log_data_op!(
            self.log_config,
            resource_id,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Fetched resource"
        );

        Ok(table)
    }
}

#[async_trait]
impl RecordSource for OpenDataClient {
    async fn fetch(&self, resource_id: &str, limit: usize) -> FetchResult<Table> {
        self.fetch_records(resource_id, limit).await
    }

    fn name(&self) -> &str {
        "open-data-api"
    }
}

/// Maps a transport failure, stripping the URL so the API key in the query
/// string never reaches a log line.
fn network_error(error: reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        format!("request timed out: {}", error.without_url())
    } else {
        error.without_url().to_string()
    };
    FetchError::Network { message }
}
