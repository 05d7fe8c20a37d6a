//! # Paper Aggregator
//!
//! Searches several bibliographic providers (Scopus, OpenAlex, Web of Science)
//! with one query, normalizes every record into a single [`Paper`] shape and
//! exports the combined list to CSV.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, SearchQuery, SearchOutcome, etc.)
//! - [`sources`]: Provider adapters behind the [`Source`] trait
//! - [`aggregator`]: Concurrent fan-out over all adapters with per-source status
//! - [`export`]: CSV writer
//! - [`config`]: Configuration management
//! - [`utils`]: HTTP client and JSON helpers
//!
//! ```no_run
//! use paper_aggregator::{Aggregator, Config, SearchQuery};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let aggregator = Aggregator::from_config(&Config::default())?;
//! let outcome = aggregator
//!     .search_and_collect(&SearchQuery::new("machine learning"))
//!     .await;
//! println!("{} papers", outcome.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod export;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use aggregator::{AggregateError, Aggregator, AggregatorOptions};
pub use config::{Config, ConfigError};
pub use export::{export_csv, write_csv, ExportError, ExportLayout, ExportOptions};
pub use models::{Paper, SearchOutcome, SearchQuery, SourceType};
pub use sources::{Source, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
