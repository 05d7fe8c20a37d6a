//! Web of Science source implementation.
//!
//! Uses the Clarivate Web of Science API. Requires an API key, sent as the
//! `X-ApiKey` header.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Paper, PaperBuilder, SearchQuery, SourceType};
use crate::sources::{redact, send_json, Source, SourceError};
use crate::utils::json::{lenient, lenient_count, lenient_list, lenient_string};
use crate::utils::HttpClient;

pub const WOS_API_BASE: &str = "https://api.clarivate.com/api/wos";

/// Default Web of Science collection
pub const DEFAULT_DATABASE_ID: &str = "WOS";

const WOS_MAX_COUNT: usize = 100;

/// Web of Science research source
#[derive(Clone)]
pub struct WosSource {
    client: HttpClient,
    api_key: Option<String>,
    database_id: String,
    base_url: String,
    enabled: bool,
}

impl WosSource {
    /// Create an enabled Web of Science source over the core collection
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            database_id: DEFAULT_DATABASE_ID.to_string(),
            base_url: WOS_API_BASE.to_string(),
            enabled: true,
        }
    }

    /// Query a different collection (e.g. `BCI`, `MEDLINE`)
    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
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

    fn parse_record(record: WosRecord) -> Paper {
        let authors = record
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.full_name);

        let journal = record.source.unwrap_or_default();

        PaperBuilder::new(SourceType::Wos)
            .title(record.title.and_then(|t| t.value))
            .authors(authors)
            .abstract_text(record.r#abstract.and_then(|a| a.value))
            .date(journal.published_biblio_date)
            .journal_name(journal.title)
            .issn(journal.issn)
            .eissn(journal.eissn)
            .doi(record.doi)
            .citations(record.times_cited)
            .build()
    }

    fn parse_response(data: WosResponse) -> Vec<Paper> {
        data.data
            .and_then(|d| d.records)
            .and_then(|r| r.records)
            .unwrap_or_default()
            .into_iter()
            .map(Self::parse_record)
            .collect()
    }
}

impl std::fmt::Debug for WosSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WosSource")
            .field("api_key", &redact(&self.api_key))
            .field("database_id", &self.database_id)
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[async_trait]
impl Source for WosSource {
    fn id(&self) -> &str {
        "wos"
    }

    fn name(&self) -> &str {
        "Web of Science"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Wos
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

        let count = query.max_results.clamp(1, WOS_MAX_COUNT).to_string();
        tracing::debug!(url = %self.base_url, query = %query.query, count = %count, "searching Web of Science");

        let request = self
            .client
            .get_json(&self.base_url)
            .header("X-ApiKey", api_key)
            .query(&[
                ("databaseId", self.database_id.as_str()),
                ("usrQuery", query.query.as_str()),
                ("count", count.as_str()),
                ("firstRecord", "1"),
            ]);

        let data: WosResponse = send_json(request).await?;
        let papers = Self::parse_response(data);

        tracing::debug!(count = papers.len(), "Web of Science returned papers");
        Ok(papers)
    }
}

// ===== Web of Science API Types =====

#[derive(Debug, Deserialize)]
struct WosResponse {
    #[serde(rename = "Data", default, deserialize_with = "lenient")]
    data: Option<WosData>,
}

#[derive(Debug, Deserialize)]
struct WosData {
    #[serde(rename = "Records", default, deserialize_with = "lenient")]
    records: Option<WosRecords>,
}

#[derive(Debug, Deserialize)]
struct WosRecords {
    #[serde(default, deserialize_with = "lenient_list")]
    records: Option<Vec<WosRecord>>,
}

#[derive(Debug, Deserialize)]
struct WosRecord {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<WosText>,

    #[serde(default, deserialize_with = "lenient_list")]
    authors: Option<Vec<WosAuthor>>,

    #[serde(default, deserialize_with = "lenient")]
    r#abstract: Option<WosText>,

    #[serde(default, deserialize_with = "lenient")]
    source: Option<WosJournal>,

    #[serde(default, deserialize_with = "lenient_count")]
    times_cited: Option<u32>,

    #[serde(default, deserialize_with = "lenient_string")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WosText {
    #[serde(default, deserialize_with = "lenient_string")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WosAuthor {
    #[serde(default, deserialize_with = "lenient_string")]
    full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WosJournal {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    issn: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    eissn: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    published_biblio_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NOT_AVAILABLE, UNKNOWN_DATE};
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<Paper> {
        WosSource::parse_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_parse_full_record() {
        let papers = parse(json!({
            "Data": { "Records": { "records": [{
                "title": { "value": "Machine Learning in Economics" },
                "authors": [ { "full_name": "Doe, Jane" }, { "full_name": "Roe, Richard" } ],
                "abstract": { "value": "An overview." },
                "source": {
                    "title": "Journal of Economic Perspectives",
                    "issn": "0895-3309",
                    "eissn": "1944-7965",
                    "published_biblio_date": "2019"
                },
                "times_cited": 321,
                "doi": "10.1257/jep.31.2.87"
            }] } }
        }));

        assert_eq!(papers.len(), 1);
        let p = &papers[0];
        assert_eq!(p.title, "Machine Learning in Economics");
        assert_eq!(p.authors, "Doe, Jane; Roe, Richard");
        assert_eq!(p.r#abstract, "An overview.");
        assert_eq!(p.date, "2019-01-01");
        assert_eq!(p.source, SourceType::Wos);
        assert_eq!(p.quality_score, 0.85);
        assert_eq!(p.journal_name, "Journal of Economic Perspectives");
        assert_eq!(p.issn, "08953309");
        assert_eq!(p.eissn, "19447965");
        assert_eq!(p.citations, 321);
        assert_eq!(p.url, "https://doi.org/10.1257/jep.31.2.87");
    }

    #[test]
    fn test_parse_record_without_optional_blocks() {
        let papers = parse(json!({
            "Data": { "Records": { "records": [{ "authors": [ {} ] }] } }
        }));

        let p = &papers[0];
        assert_eq!(p.title, NOT_AVAILABLE);
        assert_eq!(p.authors, NOT_AVAILABLE);
        assert_eq!(p.r#abstract, NOT_AVAILABLE);
        assert_eq!(p.date, UNKNOWN_DATE);
        assert_eq!(p.journal_name, NOT_AVAILABLE);
        assert_eq!(p.doi, NOT_AVAILABLE);
        assert_eq!(p.citations, 0);
    }

    #[test]
    fn test_mistyped_record_keeps_page() {
        let papers = parse(json!({
            "Data": { "Records": { "records": [
                { "title": { "value": "Good record" }, "times_cited": 4 },
                {
                    "title": "Plain string title",
                    "authors": "Doe, Jane",
                    "abstract": ["not", "a", "block"],
                    "source": 17,
                    "doi": "10.1000/kept"
                },
                "not a record"
            ] } }
        }));

        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "Good record");
        assert_eq!(papers[0].citations, 4);
        assert_eq!(papers[1].title, NOT_AVAILABLE);
        assert_eq!(papers[1].authors, NOT_AVAILABLE);
        assert_eq!(papers[1].r#abstract, NOT_AVAILABLE);
        assert_eq!(papers[1].journal_name, NOT_AVAILABLE);
        assert_eq!(papers[1].doi, "10.1000/kept");
    }

    #[test]
    fn test_parse_missing_envelope() {
        assert!(parse(json!({})).is_empty());
        assert!(parse(json!({ "Data": {} })).is_empty());
        assert!(parse(json!({ "Data": { "Records": { "records": [] } } })).is_empty());
        assert!(parse(json!({ "Data": { "Records": "none" } })).is_empty());
    }

    #[test]
    fn test_validate_requires_key() {
        let client = HttpClient::new().unwrap();
        assert!(WosSource::new(client.clone(), Some("key".into())).validate().is_ok());
        assert!(WosSource::new(client, None).validate().is_err());
    }
}
