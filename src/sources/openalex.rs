//! OpenAlex research source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Paper, PaperBuilder, SearchQuery, SourceType};
use crate::sources::{send_json, Source, SourceError};
use crate::utils::json::{lenient, lenient_count, lenient_list, lenient_string};
use crate::utils::HttpClient;

pub const OPENALEX_API_BASE: &str = "https://api.openalex.org/works";

/// OpenAlex caps `per-page` at 200
const OPENALEX_MAX_PER_PAGE: usize = 200;

/// OpenAlex research source
///
/// Uses the OpenAlex REST API. No key is needed; an email address puts
/// requests in the "polite pool".
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    email: Option<String>,
    base_url: String,
    enabled: bool,
}

impl OpenAlexSource {
    /// Create an enabled OpenAlex source
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            email: None,
            base_url: OPENALEX_API_BASE.to_string(),
            enabled: true,
        }
    }

    /// Create with an email (recommended for better rate limits)
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    /// Point the source at a different works endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable or disable the source
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Parse OpenAlex paper data
    ///
    /// The abstract arrives as an inverted index and is not rebuilt; the
    /// placeholder is used instead.
    fn parse_paper(data: OAWork) -> Paper {
        let authors = data
            .authorships
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.author.and_then(|author| author.display_name));

        let (landing_url, venue) = match data.primary_location {
            Some(location) => (location.landing_page_url, location.source),
            None => (None, None),
        };
        let venue = venue.or(data.host_venue);
        let (journal_name, issn) = match venue {
            Some(v) => (v.display_name, v.issn_l),
            None => (None, None),
        };

        PaperBuilder::new(SourceType::OpenAlex)
            .title(data.title)
            .authors(authors)
            .date(data.publication_date)
            .journal_name(journal_name)
            .issn(issn)
            .doi(data.doi)
            .url(landing_url)
            .citations(data.cited_by_count)
            .build()
    }

    fn parse_response(data: WorksResponse) -> Vec<Paper> {
        data.results
            .unwrap_or_default()
            .into_iter()
            .map(Self::parse_paper)
            .collect()
    }
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn source_type(&self) -> SourceType {
        SourceType::OpenAlex
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        let per_page = query.max_results.clamp(1, OPENALEX_MAX_PER_PAGE).to_string();
        tracing::debug!(url = %self.base_url, query = %query.query, per_page = %per_page, "searching OpenAlex");

        let mut request = self
            .client
            .get_json(&self.base_url)
            .query(&[("search", query.query.as_str()), ("per-page", per_page.as_str())]);

        // Add email for the polite pool
        if let Some(ref email) = self.email {
            request = request.query(&[("mailto", email.as_str())]);
        }

        let data: WorksResponse = send_json(request).await?;
        let papers = Self::parse_response(data);

        tracing::debug!(count = papers.len(), "OpenAlex returned papers");
        Ok(papers)
    }
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    results: Option<Vec<OAWork>>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    publication_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_count")]
    cited_by_count: Option<u32>,

    #[serde(default, deserialize_with = "lenient_string")]
    doi: Option<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    authorships: Option<Vec<OAAuthorship>>,

    #[serde(default, deserialize_with = "lenient")]
    primary_location: Option<OALocation>,

    /// Legacy venue block, still present on older snapshots
    #[serde(default, deserialize_with = "lenient")]
    host_venue: Option<OAVenue>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    #[serde(default, deserialize_with = "lenient")]
    author: Option<OAAuthor>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OALocation {
    #[serde(default, deserialize_with = "lenient_string")]
    landing_page_url: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    source: Option<OAVenue>,
}

#[derive(Debug, Deserialize)]
struct OAVenue {
    #[serde(default, deserialize_with = "lenient_string")]
    display_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    issn_l: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NOT_AVAILABLE, UNKNOWN_DATE};
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Paper {
        OpenAlexSource::parse_paper(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_parse_full_work() {
        let paper = parse(json!({
            "id": "https://openalex.org/W1",
            "title": "Attention Is All You Need",
            "publication_date": "2017-06-12",
            "cited_by_count": 90000,
            "doi": "https://doi.org/10.48550/arxiv.1706.03762",
            "abstract_inverted_index": { "The": [0] },
            "authorships": [
                { "author": { "display_name": "Ashish Vaswani" } },
                { "author": { "display_name": "Noam Shazeer" } }
            ],
            "primary_location": {
                "landing_page_url": "https://arxiv.org/abs/1706.03762",
                "source": { "display_name": "arXiv", "issn_l": "2331-8422" }
            }
        }));

        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.authors, "Ashish Vaswani; Noam Shazeer");
        assert_eq!(paper.r#abstract, NOT_AVAILABLE);
        assert_eq!(paper.date, "2017-06-12");
        assert_eq!(paper.source, SourceType::OpenAlex);
        assert_eq!(paper.quality_score, 0.0);
        assert_eq!(paper.citations, 90000);
        assert_eq!(paper.doi, "10.48550/arxiv.1706.03762");
        assert_eq!(paper.url, "https://arxiv.org/abs/1706.03762");
        assert_eq!(paper.journal_name, "arXiv");
        assert_eq!(paper.issn, "23318422");
    }

    #[test]
    fn test_parse_url_falls_back_to_doi() {
        let paper = parse(json!({
            "title": "T",
            "doi": "https://doi.org/10.1/xyz",
            "primary_location": { "landing_page_url": null, "source": null }
        }));
        assert_eq!(paper.url, "https://doi.org/10.1/xyz");
    }

    #[test]
    fn test_parse_legacy_host_venue() {
        let paper = parse(json!({
            "title": "T",
            "host_venue": { "display_name": "Old Journal", "issn_l": "1111-2222" }
        }));
        assert_eq!(paper.journal_name, "Old Journal");
        assert_eq!(paper.issn, "11112222");
    }

    #[test]
    fn test_parse_sparse_work() {
        let paper = parse(json!({
            "title": null,
            "authorships": [ { "author": {} }, {} ],
            "primary_location": null
        }));

        assert_eq!(paper.title, NOT_AVAILABLE);
        assert_eq!(paper.authors, NOT_AVAILABLE);
        assert_eq!(paper.date, UNKNOWN_DATE);
        assert_eq!(paper.doi, NOT_AVAILABLE);
        assert_eq!(paper.url, NOT_AVAILABLE);
        assert_eq!(paper.journal_name, NOT_AVAILABLE);
        assert_eq!(paper.citations, 0);
    }

    #[test]
    fn test_mistyped_work_keeps_page() {
        let data: WorksResponse = serde_json::from_value(json!({
            "results": [
                { "title": "Good work", "cited_by_count": 3 },
                {
                    "title": "Odd work",
                    "authorships": [ { "author": "Jane Doe" }, { "author": { "display_name": "Ann Lee" } } ],
                    "primary_location": "https://example.org/odd",
                    "host_venue": [ "Old Journal" ]
                },
                42
            ]
        }))
        .unwrap();

        let papers = OpenAlexSource::parse_response(data);
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "Good work");
        assert_eq!(papers[0].citations, 3);
        assert_eq!(papers[1].title, "Odd work");
        assert_eq!(papers[1].authors, "Ann Lee");
        assert_eq!(papers[1].url, NOT_AVAILABLE);
        assert_eq!(papers[1].journal_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_blank_email_ignored() {
        let source = OpenAlexSource::new(HttpClient::new().unwrap()).with_email(Some(" ".into()));
        assert!(source.email.is_none());
    }
}
