//! Core data models for normalized papers and search operations.

mod paper;
mod search;

pub use paper::{
    doi_url, format_score, normalize_date, normalize_doi, Paper, PaperBuilder, SourceType,
    NOT_AVAILABLE, UNKNOWN_DATE,
};
pub use search::{
    FilterError, FilterSet, OutcomeKind, SearchOutcome, SearchQuery, SourceReport, SourceStatus,
    DEFAULT_PAGE_SIZE,
};
