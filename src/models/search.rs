//! Search request and outcome models.

use serde::{Deserialize, Serialize};

use crate::models::{Paper, SourceType};

/// Default number of results requested from each provider
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// A filter set that no paper could ever satisfy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Minimum quality must be between 0 and 1, got {0}")]
    InvalidMinQuality(f64),

    #[error("Year range is inverted: {from} is after {to}")]
    InvertedYearRange { from: i32, to: i32 },
}

/// Optional filters applied to the aggregated results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Earliest publication year (inclusive)
    pub year_from: Option<i32>,

    /// Latest publication year (inclusive)
    pub year_to: Option<i32>,

    /// Minimum per-source quality score
    pub min_quality: Option<f64>,
}

impl FilterSet {
    /// Whether no filter is set
    pub fn is_empty(&self) -> bool {
        self.year_from.is_none() && self.year_to.is_none() && self.min_quality.is_none()
    }

    /// Reject bounds that would silently drop every paper
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(min) = self.min_quality {
            if !(0.0..=1.0).contains(&min) {
                return Err(FilterError::InvalidMinQuality(min));
            }
        }
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(FilterError::InvertedYearRange { from, to });
            }
        }
        Ok(())
    }

    /// Check a paper against every configured filter.
    ///
    /// Papers with an unknown date never satisfy a year bound.
    pub fn matches(&self, paper: &Paper) -> bool {
        if self.year_from.is_some() || self.year_to.is_some() {
            let Some(year) = paper.year() else {
                return false;
            };
            if self.year_from.is_some_and(|from| year < from) {
                return false;
            }
            if self.year_to.is_some_and(|to| year > to) {
                return false;
            }
        }

        match self.min_quality {
            Some(min) => paper.quality_score >= min,
            None => true,
        }
    }
}

/// Search query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query string
    pub query: String,

    /// Page size requested from each provider
    pub max_results: usize,

    /// Filters applied after aggregation
    pub filters: FilterSet,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: DEFAULT_PAGE_SIZE,
            filters: FilterSet::default(),
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results per provider
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set earliest publication year
    pub fn year_from(mut self, year: i32) -> Self {
        self.filters.year_from = Some(year);
        self
    }

    /// Set latest publication year
    pub fn year_to(mut self, year: i32) -> Self {
        self.filters.year_to = Some(year);
        self
    }

    /// Set minimum quality score
    pub fn min_quality(mut self, min: f64) -> Self {
        self.filters.min_quality = Some(min);
        self
    }

    /// Replace the filter set
    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }
}

/// What happened to a single source during one aggregate search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source answered; `count` papers were normalized (may be zero)
    Succeeded { count: usize },
    /// The source is switched off in configuration
    Disabled,
    /// Transport, protocol or parse failure
    Failed { reason: String },
    /// The per-source timeout elapsed
    TimedOut,
}

impl SourceStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, SourceStatus::Failed { .. } | SourceStatus::TimedOut)
    }
}

/// Per-source status line of an aggregate search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Identifier of the adapter (`scopus`, `openalex`, `wos`, ...)
    pub source_id: String,

    pub source: SourceType,

    pub status: SourceStatus,
}

/// Coarse classification of an aggregate search result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// At least one paper was found
    Results(usize),
    /// Every queried source answered, none had matches
    NoResults,
    /// Nothing found and every enabled source failed (or none was enabled)
    AllSourcesFailed,
}

/// Aggregated papers plus the per-source report feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Query that was executed
    pub query: String,

    /// Papers in adapter registration order
    pub papers: Vec<Paper>,

    /// One report per registered adapter, in registration order
    pub reports: Vec<SourceReport>,
}

impl SearchOutcome {
    pub fn new(query: impl Into<String>, papers: Vec<Paper>, reports: Vec<SourceReport>) -> Self {
        Self {
            query: query.into(),
            papers,
            reports,
        }
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Reports of sources that failed or timed out
    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.status.is_failure())
    }

    /// Whether no enabled source produced an answer
    pub fn all_failed(&self) -> bool {
        !self
            .reports
            .iter()
            .any(|r| matches!(r.status, SourceStatus::Succeeded { .. }))
    }

    /// Classify the outcome so callers can render distinct messages
    pub fn kind(&self) -> OutcomeKind {
        if !self.papers.is_empty() {
            OutcomeKind::Results(self.papers.len())
        } else if self.all_failed() {
            OutcomeKind::AllSourcesFailed
        } else {
            OutcomeKind::NoResults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperBuilder;

    fn report(source: SourceType, status: SourceStatus) -> SourceReport {
        SourceReport {
            source_id: source.id().to_string(),
            source,
            status,
        }
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("machine learning")
            .max_results(5)
            .year_from(2018)
            .year_to(2022)
            .min_quality(0.5);

        assert_eq!(query.query, "machine learning");
        assert_eq!(query.max_results, 5);
        assert_eq!(query.filters.year_from, Some(2018));
        assert_eq!(query.filters.year_to, Some(2022));
        assert_eq!(query.filters.min_quality, Some(0.5));
        assert!(!query.filters.is_empty());
        assert!(SearchQuery::new("x").filters.is_empty());
    }

    #[test]
    fn test_filter_year_range() {
        let filters = FilterSet {
            year_from: Some(2018),
            year_to: Some(2020),
            min_quality: None,
        };
        let inside = PaperBuilder::new(SourceType::Scopus).date(Some("2019-05-01")).build();
        let before = PaperBuilder::new(SourceType::Scopus).date(Some("2017-12-31")).build();
        let after = PaperBuilder::new(SourceType::Scopus).date(Some("2021-01-01")).build();
        let unknown = PaperBuilder::new(SourceType::Scopus).build();

        assert!(filters.matches(&inside));
        assert!(!filters.matches(&before));
        assert!(!filters.matches(&after));
        assert!(!filters.matches(&unknown));
    }

    #[test]
    fn test_filter_min_quality() {
        let filters = FilterSet {
            min_quality: Some(0.8),
            ..Default::default()
        };
        assert!(filters.matches(&PaperBuilder::new(SourceType::Scopus).build()));
        assert!(filters.matches(&PaperBuilder::new(SourceType::Wos).build()));
        assert!(!filters.matches(&PaperBuilder::new(SourceType::OpenAlex).build()));
    }

    #[test]
    fn test_filter_validation() {
        assert!(FilterSet::default().validate().is_ok());

        let single_year = FilterSet {
            year_from: Some(2020),
            year_to: Some(2020),
            min_quality: Some(0.0),
        };
        assert!(single_year.validate().is_ok());

        let inverted = FilterSet {
            year_from: Some(2022),
            year_to: Some(2018),
            ..Default::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(FilterError::InvertedYearRange { from: 2022, to: 2018 })
        );

        for min in [f64::NAN, f64::INFINITY, -0.1, 1.5] {
            let filters = FilterSet {
                min_quality: Some(min),
                ..Default::default()
            };
            assert!(matches!(filters.validate(), Err(FilterError::InvalidMinQuality(_))));
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filters = FilterSet::default();
        assert!(filters.matches(&PaperBuilder::new(SourceType::OpenAlex).build()));
    }

    #[test]
    fn test_outcome_kind_no_results() {
        let outcome = SearchOutcome::new(
            "q",
            Vec::new(),
            vec![
                report(SourceType::Scopus, SourceStatus::Succeeded { count: 0 }),
                report(SourceType::Wos, SourceStatus::Failed { reason: "boom".into() }),
            ],
        );
        assert_eq!(outcome.kind(), OutcomeKind::NoResults);
        assert_eq!(outcome.failures().count(), 1);
    }

    #[test]
    fn test_outcome_kind_all_failed() {
        let outcome = SearchOutcome::new(
            "q",
            Vec::new(),
            vec![
                report(SourceType::Scopus, SourceStatus::TimedOut),
                report(SourceType::OpenAlex, SourceStatus::Disabled),
                report(SourceType::Wos, SourceStatus::Failed { reason: "503".into() }),
            ],
        );
        assert_eq!(outcome.kind(), OutcomeKind::AllSourcesFailed);
        assert_eq!(outcome.failures().count(), 2);
    }

    #[test]
    fn test_outcome_kind_results() {
        let outcome = SearchOutcome::new(
            "q",
            vec![PaperBuilder::new(SourceType::OpenAlex).build()],
            vec![report(SourceType::OpenAlex, SourceStatus::Succeeded { count: 1 })],
        );
        assert_eq!(outcome.kind(), OutcomeKind::Results(1));
        assert_eq!(outcome.len(), 1);
    }
}
