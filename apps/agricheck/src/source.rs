//! # Row Sources
//!
//! Where a taxonomy snapshot comes from.
//!
//! - `Endpoint`: live SPARQL endpoint, queried once per `load()`
//! - `Snapshot`: a results document captured earlier with `agricheck fetch`
//!
//! Either way `load()` returns a freshly materialized `NodeMap`; nothing is
//! cached between calls.

use crate::client::SparqlClient;
use crate::config::AppConfig;
use agricheck_core::{AgricheckError, NodeKind, NodeMap, SparqlResults, hierarchy_query, snapshot_from_results};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Maximum snapshot file size (100 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Source of query results.
#[derive(Debug, Clone)]
pub enum RowSource {
    /// Live endpoint plus the query text sent to it.
    Endpoint { client: SparqlClient, query: String },
    /// Pre-fetched results document.
    Snapshot(Arc<SparqlResults>),
}

impl RowSource {
    /// Build a live source from configuration.
    pub fn endpoint(config: &AppConfig) -> Result<Self, AgricheckError> {
        let client = SparqlClient::new(&config.endpoint, Duration::from_secs(config.timeout_secs))?;
        let query = hierarchy_query(&config.language)?;
        Ok(Self::Endpoint { client, query })
    }

    /// Wrap an in-memory results document.
    #[must_use]
    pub fn snapshot(results: SparqlResults) -> Self {
        Self::Snapshot(Arc::new(results))
    }

    /// Read a results document from disk.
    pub fn from_file(path: &Path) -> Result<Self, AgricheckError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| AgricheckError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
        if metadata.len() > MAX_SNAPSHOT_FILE_SIZE {
            return Err(AgricheckError::SerializationError(format!(
                "Snapshot size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SNAPSHOT_FILE_SIZE
            )));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| AgricheckError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
        Ok(Self::snapshot(SparqlResults::from_json(&bytes)?))
    }

    /// Short description for logs and banners.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Endpoint { client, .. } => format!("endpoint {}", client.endpoint()),
            Self::Snapshot(results) => format!("snapshot ({} rows)", results.row_count()),
        }
    }

    /// Fetch the raw results document.
    pub async fn fetch_results(&self) -> Result<SparqlResults, AgricheckError> {
        match self {
            Self::Endpoint { client, query } => client.fetch_results(query).await.map_err(|e| {
                tracing::warn!(endpoint = %client.endpoint(), error = %e, "SPARQL fetch failed");
                AgricheckError::from(e)
            }),
            Self::Snapshot(results) => Ok(results.as_ref().clone()),
        }
    }

    /// Fetch and materialize a fresh snapshot.
    pub async fn load(&self) -> Result<NodeMap, AgricheckError> {
        let results = self.fetch_results().await?;
        let nodes = snapshot_from_results(&results)?;
        tracing::debug!(
            rows = results.row_count(),
            nodes = nodes.len(),
            collections = nodes.count_kind(NodeKind::Collection),
            inspection_points = nodes.count_kind(NodeKind::InspectionPoint),
            "Snapshot materialized"
        );
        Ok(nodes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agricheck_core::sparql::{Binding, BindingValue};
    use std::io::Write;

    fn one_row() -> SparqlResults {
        let binding: Binding = [
            ("s".to_string(), BindingValue::uri("https://x.org/C1")),
            (
                "sType".to_string(),
                BindingValue::uri("http://purl.org/dc/terms/Collection"),
            ),
        ]
        .into_iter()
        .collect();
        SparqlResults::from_bindings(vec![binding])
    }

    #[tokio::test]
    async fn snapshot_source_materializes() {
        let source = RowSource::snapshot(one_row());
        let nodes = source.load().await.expect("load");
        assert_eq!(nodes.len(), 1);
        assert_eq!(source.describe(), "snapshot (1 rows)");
    }

    #[tokio::test]
    async fn snapshot_file_round_trips() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let json = one_row().to_json_pretty().expect("json");
        file.write_all(json.as_bytes()).expect("write");

        let source = RowSource::from_file(file.path()).expect("from_file");
        assert_eq!(source.fetch_results().await.expect("fetch"), one_row());
    }

    #[test]
    fn invalid_language_is_rejected() {
        let config = AppConfig {
            language: "de\" }".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            RowSource::endpoint(&config),
            Err(AgricheckError::InvalidLanguage(_))
        ));
    }
}
