//! Paper model representing one normalized record from any provider.

use serde::{Deserialize, Serialize};

/// Placeholder for any textual field the provider did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder date meaning "unknown date". Never a real publication date.
pub const UNKNOWN_DATE: &str = "1900-01-01";

/// Template used to derive a landing URL from a bare DOI.
const DOI_RESOLVER: &str = "https://doi.org/";

/// The provider a paper was retrieved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Scopus,
    OpenAlex,
    #[serde(rename = "WOS")]
    Wos,
}

impl SourceType {
    /// All providers, in default registration order.
    pub const ALL: [SourceType; 3] = [SourceType::Scopus, SourceType::OpenAlex, SourceType::Wos];

    /// Returns the display name of the source (also the value written to exports)
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Scopus => "Scopus",
            SourceType::OpenAlex => "OpenAlex",
            SourceType::Wos => "WOS",
        }
    }

    /// Returns the source identifier used in configuration keys
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::Scopus => "scopus",
            SourceType::OpenAlex => "openalex",
            SourceType::Wos => "wos",
        }
    }

    /// Fixed quality score assigned to every paper from this provider.
    ///
    /// These are placeholders carried over as-is; they are not the predicted
    /// quality index and no formula stands behind them.
    pub fn quality_score(&self) -> f64 {
        match self {
            SourceType::Scopus => 0.9,
            SourceType::OpenAlex => 0.0,
            SourceType::Wos => 0.85,
        }
    }

    /// Look a source up by its identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.id().eq_ignore_ascii_case(id.trim()))
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A research paper normalized from a provider response
///
/// Every field is always populated: missing provider data is replaced with
/// [`NOT_AVAILABLE`], [`UNKNOWN_DATE`] or `0` when the paper is built, so the
/// record can be exported without any further substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title
    pub title: String,

    /// Authors (semicolon-separated)
    pub authors: String,

    /// Abstract text
    pub r#abstract: String,

    /// Publication date (`YYYY-MM-DD`)
    pub date: String,

    /// Provider where the paper was found
    pub source: SourceType,

    /// Per-source placeholder quality value
    pub quality_score: f64,

    pub journal_name: String,

    /// Print ISSN without hyphens
    pub issn: String,

    /// Electronic ISSN without hyphens
    pub eissn: String,

    /// Bare DOI (no resolver prefix)
    pub doi: String,

    /// Landing page URL
    pub url: String,

    /// Citation count
    pub citations: u32,

    pub journal_quartile: String,
}

impl Paper {
    /// Whether the date is a real date rather than the unknown-date placeholder
    pub fn has_known_date(&self) -> bool {
        self.date != UNKNOWN_DATE
    }

    /// Publication year, if the date is known
    pub fn year(&self) -> Option<i32> {
        if !self.has_known_date() {
            return None;
        }
        self.date.get(..4).and_then(|y| y.parse().ok())
    }

    /// Whether a DOI was supplied by the provider
    pub fn has_doi(&self) -> bool {
        self.doi != NOT_AVAILABLE
    }

    /// Returns the author names as a vector
    pub fn author_list(&self) -> Vec<&str> {
        if self.authors == NOT_AVAILABLE {
            return Vec::new();
        }
        self.authors
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Flat, ordered mapping of export header to value.
    pub fn to_record(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Title", self.title.clone()),
            ("Authors", self.authors.clone()),
            ("Abstract", self.r#abstract.clone()),
            ("Date", self.date.clone()),
            ("Source", self.source.name().to_string()),
            ("QualityScore", format_score(self.quality_score)),
            ("JournalName", self.journal_name.clone()),
            ("ISSN", self.issn.clone()),
            ("eISSN", self.eissn.clone()),
            ("DOI", self.doi.clone()),
            ("URL", self.url.clone()),
            ("Citations", self.citations.to_string()),
            ("Quartile", self.journal_quartile.clone()),
        ]
    }
}

/// Format a quality score the way it is written to exports
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Build the resolver URL for a bare DOI
pub fn doi_url(doi: &str) -> String {
    format!("{}{}", DOI_RESOLVER, doi)
}

/// Strip resolver prefixes (`https://doi.org/`, `doi:`) from a DOI
pub fn normalize_doi(doi: &str) -> String {
    let doi = doi.trim();
    let lower = doi.to_ascii_lowercase();
    for prefix in ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "http://dx.doi.org/", "doi:"] {
        if lower.starts_with(prefix) {
            return doi[prefix.len()..].trim().to_string();
        }
    }
    doi.to_string()
}

/// Normalize a provider date into `YYYY-MM-DD`.
///
/// Full dates and timestamps keep their date part, `YYYY-MM` and `YYYY` are
/// pinned to the first day. Anything else is unknown.
pub fn normalize_date(raw: &str) -> Option<String> {
    use chrono::NaiveDate;

    let raw = raw.trim();
    let candidate = raw.get(..10).unwrap_or(raw);
    if let Ok(date) = NaiveDate::parse_from_str(candidate, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(&format!("{}-01-01", raw), "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string());
    }
    None
}

/// Builder for constructing Paper objects
///
/// Optional inputs are recorded as given; sentinel substitution happens in
/// [`PaperBuilder::build`].
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    source: SourceType,
    title: Option<String>,
    authors: Vec<String>,
    abstract_text: Option<String>,
    date: Option<String>,
    quality_score: Option<f64>,
    journal_name: Option<String>,
    issn: Option<String>,
    eissn: Option<String>,
    doi: Option<String>,
    url: Option<String>,
    citations: Option<u32>,
    journal_quartile: Option<String>,
}

impl PaperBuilder {
    /// Create a new builder; the source is the only required field
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            title: None,
            authors: Vec::new(),
            abstract_text: None,
            date: None,
            quality_score: None,
            journal_name: None,
            issn: None,
            eissn: None,
            doi: None,
            url: None,
            citations: None,
            journal_quartile: None,
        }
    }

    /// Set title
    pub fn title(mut self, title: Option<impl Into<String>>) -> Self {
        self.title = title.map(Into::into);
        self
    }

    /// Add one author name
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(name.into());
        self
    }

    /// Add several author names
    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: Option<impl Into<String>>) -> Self {
        self.abstract_text = abstract_text.map(Into::into);
        self
    }

    /// Set publication date (any format understood by [`normalize_date`])
    pub fn date(mut self, date: Option<impl Into<String>>) -> Self {
        self.date = date.map(Into::into);
        self
    }

    /// Override the per-source quality score
    pub fn quality_score(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn journal_name(mut self, name: Option<impl Into<String>>) -> Self {
        self.journal_name = name.map(Into::into);
        self
    }

    pub fn issn(mut self, issn: Option<impl Into<String>>) -> Self {
        self.issn = issn.map(Into::into);
        self
    }

    pub fn eissn(mut self, eissn: Option<impl Into<String>>) -> Self {
        self.eissn = eissn.map(Into::into);
        self
    }

    /// Set DOI (resolver prefixes are stripped)
    pub fn doi(mut self, doi: Option<impl Into<String>>) -> Self {
        self.doi = doi.map(Into::into);
        self
    }

    /// Set a direct landing URL
    pub fn url(mut self, url: Option<impl Into<String>>) -> Self {
        self.url = url.map(Into::into);
        self
    }

    /// Set citation count
    pub fn citations(mut self, count: Option<u32>) -> Self {
        self.citations = count;
        self
    }

    pub fn journal_quartile(mut self, quartile: Option<impl Into<String>>) -> Self {
        self.journal_quartile = quartile.map(Into::into);
        self
    }

    /// Build the Paper, substituting sentinels for everything missing
    pub fn build(self) -> Paper {
        let doi = non_blank(self.doi).map(|d| normalize_doi(&d)).filter(|d| !d.is_empty());
        let url = non_blank(self.url)
            .or_else(|| doi.as_deref().map(doi_url))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let authors = self
            .authors
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join("; ");

        Paper {
            title: or_sentinel(self.title),
            authors: if authors.is_empty() { NOT_AVAILABLE.to_string() } else { authors },
            r#abstract: or_sentinel(self.abstract_text),
            date: self
                .date
                .as_deref()
                .and_then(normalize_date)
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            source: self.source,
            quality_score: self.quality_score.unwrap_or_else(|| self.source.quality_score()),
            journal_name: or_sentinel(self.journal_name),
            issn: or_sentinel(self.issn.map(|s| s.replace('-', ""))),
            eissn: or_sentinel(self.eissn.map(|s| s.replace('-', ""))),
            doi: doi.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            url,
            citations: self.citations.unwrap_or(0),
            journal_quartile: or_sentinel(self.journal_quartile),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn or_sentinel(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
