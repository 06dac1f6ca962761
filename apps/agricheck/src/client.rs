//! # SPARQL HTTP Client
//!
//! Sends the hierarchy query to the configured endpoint and returns the
//! parsed results document. One request per call, no retries.

use agricheck_core::{AgricheckError, SparqlResults};
use std::time::Duration;

const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Longest slice of an error body carried into the error message.
const MAX_ERROR_BODY: usize = 512;

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the endpoint.
    ConnectionFailed(String),
    /// The request did not finish in time.
    Timeout(String),
    /// The endpoint answered with a non-success status.
    Status { status: u16, reason: String, body: String },
    /// Failed to parse the response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(msg) => write!(f, "Cannot connect to SPARQL endpoint: {msg}"),
            Self::Timeout(url) => write!(f, "SPARQL request to {url} timed out"),
            Self::Status {
                status,
                reason,
                body,
            } => {
                write!(f, "SPARQL request failed: {status} {reason}")?;
                if !body.is_empty() {
                    write!(f, " ({body})")?;
                }
                Ok(())
            }
            Self::ParseError(msg) => write!(f, "Invalid SPARQL response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for AgricheckError {
    fn from(e: ClientError) -> Self {
        AgricheckError::FetchFailed(e.to_string())
    }
}

/// HTTP client bound to one SPARQL endpoint.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SparqlClient {
    /// Create a client for `endpoint` with a whole-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agricheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the request and map transport errors.
    async fn send(&self, query: &str) -> Result<reqwest::Response, ClientError> {
        self.http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, SPARQL_QUERY_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.endpoint.clone())
                } else {
                    ClientError::ConnectionFailed(format!("{}: {e}", self.endpoint))
                }
            })
    }

    /// Check the status code and parse the results document.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<SparqlResults, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body: body.trim().to_string(),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        SparqlResults::from_json(&bytes).map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// POST `query` and return the results document.
    pub async fn fetch_results(&self, query: &str) -> Result<SparqlResults, ClientError> {
        tracing::debug!(endpoint = %self.endpoint, "Sending SPARQL query");
        let resp = self.send(query).await?;
        let results = self.handle_response(resp).await?;
        tracing::info!(
            endpoint = %self.endpoint,
            rows = results.row_count(),
            "SPARQL query answered"
        );
        Ok(results)
    }
}

// =============================================================================
// TESTS
// =============================================================================
