//! Scopus source implementation.
//!
//! Uses the Elsevier Scopus Search API.
//! API documentation: <https://dev.elsevier.com/documentation/ScopusSearchAPI.wadl>
//!
//! Requires an API key from dev.elsevier.com, sent as the `X-ELS-APIKey` header.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Paper, PaperBuilder, SearchQuery, SourceType};
use crate::sources::{redact, send_json, Source, SourceError};
use crate::utils::json::{lenient, lenient_count, lenient_list, lenient_string};
use crate::utils::HttpClient;

pub const SCOPUS_API_BASE: &str = "https://api.elsevier.com/content/search/scopus";

/// Largest page the standard Scopus view accepts
const SCOPUS_MAX_COUNT: usize = 25;

/// Scopus research source
#[derive(Clone)]
pub struct ScopusSource {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    enabled: bool,
}

impl ScopusSource {
    /// Create an enabled Scopus source
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: SCOPUS_API_BASE.to_string(),
            enabled: true,
        }
    }

    /// Point the source at a different search endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable or disable the source
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn parse_entry(entry: ScopusEntry) -> Paper {
        PaperBuilder::new(SourceType::Scopus)
            .title(entry.title)
            .authors(entry.creator)
            .abstract_text(entry.description)
            .date(entry.cover_date)
            .journal_name(entry.publication_name)
            .issn(entry.issn)
            .eissn(entry.eissn)
            .doi(entry.doi)
            .citations(entry.cited_by_count)
            .build()
    }

    fn parse_response(data: ScopusResponse) -> Vec<Paper> {
        data.search_results
            .and_then(|r| r.entry)
            .unwrap_or_default()
            .into_iter()
            // An empty result set comes back as a single entry carrying `error`
            .filter(|e| e.error.is_none())
            .map(Self::parse_entry)
            .collect()
    }
}

impl std::fmt::Debug for ScopusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopusSource")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[async_trait]
impl Source for ScopusSource {
    fn id(&self) -> &str {
        "scopus"
    }

    fn name(&self) -> &str {
        "Scopus"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Scopus
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn validate(&self) -> Result<(), SourceError> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(SourceError::MissingApiKey(self.name().to_string())),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::MissingApiKey(self.name().to_string()))?;

        let count = query.max_results.clamp(1, SCOPUS_MAX_COUNT);
        tracing::debug!(url = %self.base_url, query = %query.query, count, "searching Scopus");

        let count = count.to_string();
        let request = self
            .client
            .get_json(&self.base_url)
            .header("X-ELS-APIKey", api_key)
            .query(&[("query", query.query.as_str()), ("count", count.as_str())]);

        let data: ScopusResponse = send_json(request).await?;
        let papers = Self::parse_response(data);

        tracing::debug!(count = papers.len(), "Scopus returned papers");
        Ok(papers)
    }
}

// ===== Scopus API Types =====

#[derive(Debug, Deserialize)]
struct ScopusResponse {
    #[serde(rename = "search-results", default, deserialize_with = "lenient")]
    search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default, deserialize_with = "lenient_list")]
    entry: Option<Vec<ScopusEntry>>,
}

#[derive(Debug, Deserialize)]
struct ScopusEntry {
    #[serde(rename = "dc:title", default, deserialize_with = "lenient_string")]
    title: Option<String>,

    #[serde(rename = "dc:creator", default, deserialize_with = "lenient_string")]
    creator: Option<String>,

    #[serde(rename = "dc:description", default, deserialize_with = "lenient_string")]
    description: Option<String>,

    #[serde(rename = "prism:coverDate", default, deserialize_with = "lenient_string")]
    cover_date: Option<String>,

    #[serde(rename = "prism:publicationName", default, deserialize_with = "lenient_string")]
    publication_name: Option<String>,

    #[serde(rename = "prism:issn", default, deserialize_with = "lenient_string")]
    issn: Option<String>,

    #[serde(rename = "prism:eIssn", default, deserialize_with = "lenient_string")]
    eissn: Option<String>,

    #[serde(rename = "prism:doi", default, deserialize_with = "lenient_string")]
    doi: Option<String>,

    #[serde(rename = "citedby-count", default, deserialize_with = "lenient_count")]
    cited_by_count: Option<u32>,

    #[serde(default, deserialize_with = "lenient_string")]
    error: Option<String>,
}
