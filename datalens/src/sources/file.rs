use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::sources::{parse_envelope, validate_resource_id, FetchError, FetchResult, RecordSource};
use crate::table::Table;

/// Serves saved API responses from a directory.
///
/// `fetch("abc", n)` reads `<dir>/abc.json`, which must hold the same
/// `{"records": [...]}` envelope the API returns, and keeps the first `n`
/// records. A file that cannot be read is reported as a network error, the
/// file system being this source's transport.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The file backing a resource id.
    pub fn path_for(&self, resource_id: &str) -> PathBuf {
        self.dir.join(format!("{resource_id}.json"))
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    #[instrument(skip(self))]
    async fn fetch(&self, resource_id: &str, limit: usize) -> FetchResult<Table> {
        validate_resource_id(resource_id)?;
        let path = self.path_for(resource_id);
        debug!(path = %path.display(), "Reading saved resource");

        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| FetchError::Network {
                message: format!("cannot read {}: {e}", path.display()),
            })?;

        let mut table = parse_envelope(&body)?;
        table.truncate(limit);
        Ok(table)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rain.json"),
            r#"{"records": [{"state": "Goa"}, {"state": "Assam"}, {"state": "Bihar"}]}"#,
        )
        .unwrap();

        let source = JsonFileSource::new(dir.path());
        let table = source.fetch("rain", 2).await.unwrap();
        assert_eq!(table.num_rows(), 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path());
        let err = source.fetch("absent", 10).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"{"rows": []}"#).unwrap();
        let err = JsonFileSource::new(dir.path())
            .fetch("bad", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }
}
