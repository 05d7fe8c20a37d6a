//! Aggregation controller.
//!
//! Fans one query out to every registered source concurrently, waits for all
//! of them, and concatenates the results in registration order. A failing or
//! slow source only loses its own contribution.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigError};
use crate::models::{FilterError, Paper, SearchOutcome, SearchQuery, SourceReport, SourceStatus};
use crate::sources::{Source, SourceRegistry};
use crate::utils::{HttpClient, DEFAULT_TIMEOUT};

/// Controller settings
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Upper bound on a single source call
    pub source_timeout: Duration,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            source_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AggregatorOptions {
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }
}

/// Controller errors
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Source '{source_id}' is misconfigured: {reason}")]
    InvalidSource { source_id: String, reason: String },

    #[error("Invalid search filters: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Search was cancelled")]
    Cancelled,
}

/// Runs one query against an ordered set of sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: SourceRegistry,
    options: AggregatorOptions,
}

impl Aggregator {
    /// Create a controller over `sources`, kept in the given order.
    ///
    /// Sources sharing an ID are all kept. Every enabled source is validated
    /// first; a misconfigured one (such as a keyed source without a key)
    /// fails construction.
    pub fn new(
        sources: Vec<Arc<dyn Source>>,
        options: AggregatorOptions,
    ) -> Result<Self, AggregateError> {
        Self::with_registry(sources.into_iter().collect(), options)
    }

    /// Create a controller over an existing registry
    pub fn with_registry(
        registry: SourceRegistry,
        options: AggregatorOptions,
    ) -> Result<Self, AggregateError> {
        for source in registry.enabled() {
            source.validate().map_err(|e| AggregateError::InvalidSource {
                source_id: source.id().to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self { registry, options })
    }

    /// Build the Scopus, OpenAlex and Web of Science adapters from configuration
    pub fn from_config(config: &Config) -> Result<Self, AggregateError> {
        config.validate()?;

        let client = HttpClient::with_timeout(config.search.timeout())?;
        let registry = SourceRegistry::from_config(config, &client);
        let options = AggregatorOptions::default().with_source_timeout(config.search.timeout());

        Self::with_registry(registry, options)
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    /// Query every source and collect the results.
    ///
    /// Never fails: each source's problems end up in its [`SourceReport`].
    /// Filters are applied as given; see [`FilterSet::validate`](crate::models::FilterSet::validate).
    pub async fn search_and_collect(&self, query: &SearchQuery) -> SearchOutcome {
        let tasks = self.registry.all().map(|source| self.run_source(source, query));
        let results = join_all(tasks).await;

        let mut papers = Vec::new();
        let mut reports = Vec::with_capacity(results.len());
        for (found, report) in results {
            papers.extend(found);
            reports.push(report);
        }

        let total = papers.len();
        if !query.filters.is_empty() {
            papers.retain(|paper| query.filters.matches(paper));
        }

        tracing::info!(
            query = %query.query,
            collected = total,
            kept = papers.len(),
            failed = reports.iter().filter(|r| r.status.is_failure()).count(),
            "aggregate search finished"
        );

        SearchOutcome::new(query.query.clone(), papers, reports)
    }

    /// Like [`search_and_collect`](Self::search_and_collect), but gives up as
    /// soon as `token` is cancelled. In-flight requests are dropped and no
    /// partial results are returned.
    ///
    /// Filters that no paper could satisfy are rejected before any request.
    pub async fn search_and_collect_until(
        &self,
        query: &SearchQuery,
        token: &CancellationToken,
    ) -> Result<SearchOutcome, AggregateError> {
        query.filters.validate()?;

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!(query = %query.query, "aggregate search cancelled");
                Err(AggregateError::Cancelled)
            }
            outcome = self.search_and_collect(query) => Ok(outcome),
        }
    }

    async fn run_source(
        &self,
        source: &Arc<dyn Source>,
        query: &SearchQuery,
    ) -> (Vec<Paper>, SourceReport) {
        let report = |status| SourceReport {
            source_id: source.id().to_string(),
            source: source.source_type(),
            status,
        };

        match tokio::time::timeout(self.options.source_timeout, source.fetch_with_status(query)).await {
            Ok((papers, status)) => (papers, report(status)),
            Err(_) => {
                tracing::warn!(
                    source = source.id(),
                    timeout_secs = self.options.source_timeout.as_secs_f64(),
                    "source timed out, contributing no results"
                );
                (Vec::new(), report(SourceStatus::TimedOut))
            }
        }
    }
}
