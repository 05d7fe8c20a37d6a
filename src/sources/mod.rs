//! Provider adapters with a shared trait-based interface.
//!
//! This module defines the [`Source`] trait that every provider implements.
//! Adapters are registered, in order, with a [`SourceRegistry`]; the
//! [`Aggregator`](crate::aggregator::Aggregator) fans each query out to them.
//!
//! # Providers
//!
//! | id | Provider | Auth |
//! |---|---|---|
//! | `scopus` | Elsevier Scopus search API | `X-ELS-APIKey` header |
//! | `openalex` | OpenAlex works API | none (optional `mailto`) |
//! | `wos` | Clarivate Web of Science API | `X-ApiKey` header |
//!
//! # Failure policy
//!
//! [`Source::search`] reports every failure as a [`SourceError`].
//! [`Source::fetch_with_status`] is the fail-open wrapper: a disabled source
//! returns an empty list without touching the network, and any error is logged
//! and turned into an empty list plus the matching [`SourceStatus`].
//! [`Source::fetch`] drops the status.

mod mock;
mod openalex;
mod registry;
mod scopus;
mod wos;

pub use mock::{make_paper, MockSource};
pub use openalex::OpenAlexSource;
pub use registry::SourceRegistry;
pub use scopus::ScopusSource;
pub use wos::{WosSource, DEFAULT_DATABASE_ID};

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::models::{Paper, SearchQuery, SourceStatus, SourceType};
use crate::utils::truncate_for_log;

/// Maximum number of body characters kept in an API error
const ERROR_BODY_LIMIT: usize = 300;

/// The Source trait defines the interface for all provider adapters.
///
/// # Implementing a New Source
///
/// 1. Create a struct that owns its HTTP client handle, credentials and enable flag
/// 2. Implement `search` with exactly one request to the provider
/// 3. Map every raw item through [`PaperBuilder`](crate::models::PaperBuilder)
/// 4. Register it with a [`SourceRegistry`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in configuration and reports)
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Provenance tag written to every paper from this source
    fn source_type(&self) -> SourceType;

    /// Whether this source takes part in searches
    fn is_enabled(&self) -> bool;

    /// Check that the source is usable as configured
    fn validate(&self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Search the provider and normalize its results
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError>;

    /// Fail-open search that also says how the source fared
    async fn fetch_with_status(&self, query: &SearchQuery) -> (Vec<Paper>, SourceStatus) {
        if !self.is_enabled() {
            tracing::debug!(source = self.id(), "source disabled, skipping");
            return (Vec::new(), SourceStatus::Disabled);
        }

        match self.search(query).await {
            Ok(papers) => {
                tracing::debug!(source = self.id(), count = papers.len(), "source answered");
                let count = papers.len();
                (papers, SourceStatus::Succeeded { count })
            }
            Err(SourceError::Timeout(reason)) => {
                tracing::warn!(source = self.id(), error = %reason, "source timed out, contributing no results");
                (Vec::new(), SourceStatus::TimedOut)
            }
            Err(e) => {
                tracing::warn!(source = self.id(), error = %e, "source failed, contributing no results");
                (Vec::new(), SourceStatus::Failed { reason: e.to_string() })
            }
        }
    }

    /// Fail-open search: never returns an error
    async fn fetch(&self, query: &SearchQuery) -> Vec<Paper> {
        self.fetch_with_status(query).await.0
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not finish in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-2xx response from the provider
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// An enabled source has no API key
    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Send a prepared request and decode a JSON body.
///
/// Non-2xx statuses become [`SourceError::Api`] carrying a truncated body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(SourceError::Api {
            status: status.as_u16(),
            body: truncate_for_log(&text, ERROR_BODY_LIMIT),
        });
    }

    Ok(serde_json::from_str(&text)?)
}

/// Redact a secret for debug output
pub(crate) fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(s) if !s.trim().is_empty() => "<redacted>",
        _ => "<unset>",
    }
}
