//! Registry for managing provider adapters.

use std::sync::Arc;

use super::{OpenAlexSource, ScopusSource, Source, SourceError, WosSource};
use crate::config::Config;
use crate::utils::HttpClient;

/// Ordered collection of source adapters
///
/// Registration order is significant: aggregate results are concatenated in
/// this order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Scopus, OpenAlex and Web of Science adapters, in that order,
    /// sharing one HTTP client.
    pub fn from_config(config: &Config, client: &HttpClient) -> Self {
        let sources = &config.sources;
        let mut registry = Self::new();

        let mut scopus =
            ScopusSource::new(client.clone(), sources.scopus.api_key.clone()).enabled(sources.scopus.enabled);
        if let Some(ref url) = sources.scopus.base_url {
            scopus = scopus.with_base_url(url);
        }
        registry.register(Arc::new(scopus));

        let mut openalex = OpenAlexSource::new(client.clone())
            .with_email(sources.openalex.email.clone())
            .enabled(sources.openalex.enabled);
        if let Some(ref url) = sources.openalex.base_url {
            openalex = openalex.with_base_url(url);
        }
        registry.register(Arc::new(openalex));

        let mut wos = WosSource::new(client.clone(), sources.wos.api_key.clone())
            .with_database_id(&sources.wos.database_id)
            .enabled(sources.wos.enabled);
        if let Some(ref url) = sources.wos.base_url {
            wos = wos.with_base_url(url);
        }
        registry.register(Arc::new(wos));

        registry
    }

    /// Register a source, replacing (in place) any source with the same ID
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter_mut().find(|s| s.id() == source.id()) {
            Some(slot) => *slot = source,
            None => self.sources.push(source),
        }
    }

    /// Append a source, even if one with the same ID is already registered
    pub fn push(&mut self, source: Arc<dyn Source>) {
        self.sources.push(source);
    }

    /// Builder-style registration
    pub fn with(mut self, source: Arc<dyn Source>) -> Self {
        self.register(source);
        self
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get a source by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::InvalidRequest(format!("Source '{}' not found", id)))
    }

    /// Get all registered sources, in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get enabled sources, in registration order
    pub fn enabled(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter().filter(|s| s.is_enabled())
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<Arc<dyn Source>> for SourceRegistry {
    /// Keeps every source in iteration order, duplicates included
    fn from_iter<I: IntoIterator<Item = Arc<dyn Source>>>(iter: I) -> Self {
        let mut registry = SourceRegistry::new();
        for source in iter {
            registry.push(source);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::MockSource;

    #[test]
    fn test_registry_from_default_config() {
        let registry = SourceRegistry::from_config(&Config::default(), &HttpClient::new().unwrap());

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["scopus", "openalex", "wos"]);

        // Only OpenAlex works without credentials
        let enabled: Vec<&str> = registry.enabled().map(|s| s.id()).collect();
        assert_eq!(enabled, vec!["openalex"]);
    }

    #[test]
    fn test_registry_respects_enable_flags() {
        let mut config = Config::default();
        config.sources.scopus.enabled = true;
        config.sources.scopus.api_key = Some("k".into());
        config.sources.openalex.enabled = false;

        let registry = SourceRegistry::from_config(&config, &HttpClient::new().unwrap());
        let enabled: Vec<&str> = registry.enabled().map(|s| s.id()).collect();
        assert_eq!(enabled, vec!["scopus"]);
    }

    #[test]
    fn test_register_keeps_order_and_replaces() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockSource::new(SourceType::OpenAlex)));
        registry.register(Arc::new(MockSource::new(SourceType::Scopus)));
        registry.register(Arc::new(MockSource::new(SourceType::OpenAlex).disabled()));

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["openalex", "scopus"]);
        assert!(!registry.get("openalex").unwrap().is_enabled());
    }

    #[test]
    fn test_get_source() {
        let registry = SourceRegistry::new().with(Arc::new(MockSource::new(SourceType::Wos)));

        assert!(registry.has("wos"));
        assert_eq!(registry.get("wos").unwrap().source_type(), SourceType::Wos);
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.get_required("nonexistent").is_err());
    }

    #[test]
    fn test_collect_keeps_duplicate_ids() {
        let first: Arc<dyn Source> = Arc::new(MockSource::new(SourceType::Wos));
        let second: Arc<dyn Source> = Arc::new(MockSource::new(SourceType::Wos).disabled());

        let registry: SourceRegistry = vec![first, second].into_iter().collect();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["wos", "wos"]);
        assert_eq!(registry.enabled().count(), 1);
    }
}
