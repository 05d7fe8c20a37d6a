//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{Paper, PaperBuilder, SearchQuery, SourceType};
use crate::sources::{Source, SourceError};

#[derive(Debug, Clone)]
enum MockBehavior {
    Papers(Vec<Paper>),
    Fail(String),
    TimeOut,
}

/// A mock source for testing that returns predefined responses.
///
/// Counts every call to [`Source::search`] so tests can assert that disabled
/// sources are never queried.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    source_type: SourceType,
    enabled: bool,
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create an enabled mock that answers with no papers.
    pub fn new(source_type: SourceType) -> Self {
        Self {
            id: source_type.id().to_string(),
            source_type,
            enabled: true,
            behavior: MockBehavior::Papers(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Override the identifier (to register several mocks of one type).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Answer every search with these papers.
    pub fn with_papers(mut self, papers: Vec<Paper>) -> Self {
        self.behavior = MockBehavior::Papers(papers);
        self
    }

    /// Fail every search with a network error.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.behavior = MockBehavior::Fail(reason.into());
        self
    }

    /// Fail every search the way a transport timeout does.
    pub fn timing_out(mut self) -> Self {
        self.behavior = MockBehavior::TimeOut;
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Switch the source off.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Number of times `search` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn search(&self, _query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Papers(papers) => Ok(papers.clone()),
            MockBehavior::Fail(reason) => Err(SourceError::Network(reason.clone())),
            MockBehavior::TimeOut => Err(SourceError::Timeout("operation timed out".to_string())),
        }
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(title: &str, source_type: SourceType) -> Paper {
    PaperBuilder::new(source_type)
        .title(Some(title))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_returns_configured_papers() {
        let source = MockSource::new(SourceType::OpenAlex)
            .with_papers(vec![make_paper("One", SourceType::OpenAlex)]);

        let papers = tokio_test::block_on(source.search(&SearchQuery::new("q"))).unwrap();

        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "One");
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_mock_failure() {
        let source = MockSource::new(SourceType::Scopus).failing("down");

        let result = tokio_test::block_on(source.search(&SearchQuery::new("q")));

        assert!(matches!(result, Err(SourceError::Network(ref r)) if r == "down"));
    }
}
