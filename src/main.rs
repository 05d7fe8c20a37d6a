use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use paper_aggregator::config::{find_config_file, load_config, LogFormat};
use paper_aggregator::export::{export_csv, ExportLayout, ExportOptions};
use paper_aggregator::models::{OutcomeKind, Paper, SearchOutcome, SearchQuery, SourceType};
use paper_aggregator::ui::{self, Status};
use paper_aggregator::{AggregateError, Aggregator, Config};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Aggregator - Search Scopus, OpenAlex and Web of Science at once
#[derive(Parser, Debug)]
#[command(name = "paper-aggregator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search several bibliographic databases with one query and export the results", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-source timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Available providers
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    #[value(name = "scopus")]
    Scopus,
    #[value(name = "openalex")]
    OpenAlex,
    #[value(name = "wos")]
    Wos,
}

impl From<Source> for SourceType {
    fn from(source: Source) -> Self {
        match source {
            Source::Scopus => SourceType::Scopus,
            Source::OpenAlex => SourceType::OpenAlex,
            Source::Wos => SourceType::Wos,
        }
    }
}

/// CSV column layout
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// Title, authors, abstract, date, source and quality score
    Basic,
    /// Basic columns plus journal, ISSN, DOI, URL, citations and quartile
    Extended,
}

impl From<Layout> for ExportLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Basic => ExportLayout::Basic,
            Layout::Extended => ExportLayout::Extended,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search every enabled source and combine the results
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Results requested from each source (default: search.page_size)
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Keep papers published in or after this year
        #[arg(long)]
        year_from: Option<i32>,

        /// Keep papers published in or before this year
        #[arg(long)]
        year_to: Option<i32>,

        /// Keep papers whose source quality score is at least this value
        #[arg(long)]
        min_quality: Option<f64>,

        /// Write the results to this CSV file
        #[arg(long, short)]
        export: Option<PathBuf>,

        /// CSV column layout (default: export.layout)
        #[arg(long, value_enum)]
        layout: Option<Layout>,

        /// Query only these sources (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        only: Vec<Source>,
    },

    /// List configured sources
    #[command(alias = "ls")]
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    if let Some(timeout) = cli.timeout {
        config.search.timeout_secs = timeout;
    }

    match cli.command {
        Some(Commands::Search {
            query,
            max_results,
            year_from,
            year_to,
            min_quality,
            export,
            layout,
            only,
        }) => {
            if !only.is_empty() {
                let wanted: Vec<SourceType> = only.into_iter().map(SourceType::from).collect();
                for source in SourceType::ALL {
                    config.set_enabled(source, wanted.contains(&source));
                }
            }

            let mut search_query = SearchQuery::new(&query)
                .max_results(max_results.unwrap_or(config.search.page_size));
            search_query.filters.year_from = year_from;
            search_query.filters.year_to = year_to;
            search_query.filters.min_quality = min_quality;
            search_query
                .filters
                .validate()
                .context("Invalid search filters")?;

            let aggregator =
                Aggregator::from_config(&config).context("Failed to set up sources")?;

            let token = CancellationToken::new();
            let ctrl_c = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let started = Instant::now();
            let outcome = match aggregator.search_and_collect_until(&search_query, &token).await {
                Ok(outcome) => outcome,
                Err(AggregateError::Cancelled) => {
                    eprintln!("{}", ui::status_line(Status::Warning, "Search cancelled"));
                    std::process::exit(130);
                }
                Err(e) => return Err(anyhow::Error::new(e).context("Search failed")),
            };

            let format = cli.output.resolve();
            report_outcome(&outcome, format, cli.quiet, started.elapsed());

            let export_path = export.or_else(|| config.export.path.clone());
            if let Some(path) = export_path {
                let layout = layout.map(ExportLayout::from).unwrap_or(config.export.layout);
                let options =
                    ExportOptions::new(layout).with_delimiter(config.export.delimiter as u8);
                let rows = export_csv(&path, &outcome.papers, &options)
                    .with_context(|| format!("Failed to export results to {}", path.display()))?;
                if !cli.quiet && format != OutputFormat::Json {
                    ui::print_status(
                        Status::Success,
                        &format!("Exported {} papers to {}", rows, path.display()),
                    );
                }
            }

            if outcome.kind() == OutcomeKind::AllSourcesFailed {
                anyhow::bail!("All sources failed; no results were collected");
            }
        }

        Some(Commands::Sources) => {
            output_sources(&config, cli.output.resolve());
        }

        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("paper_aggregator={}", level)),
    );

    // Logs go to stderr so stdout stays machine-readable
    let (json, pretty) = match config.logging.format {
        LogFormat::Json => (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
}

fn report_outcome(outcome: &SearchOutcome, format: OutputFormat, quiet: bool, elapsed: Duration) {
    if format == OutputFormat::Json {
        match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize results: {}", e),
        }
        for report in outcome.failures() {
            eprintln!("{}", ui::describe_report(report));
        }
        return;
    }

    if !quiet {
        ui::print_section("Sources");
        for report in &outcome.reports {
            ui::print_report(report);
        }
    }

    match outcome.kind() {
        OutcomeKind::Results(count) => {
            if !quiet {
                ui::print_search_header(&outcome.query, count, elapsed);
            }
            output_papers(&outcome.papers, format);
        }
        OutcomeKind::NoResults => {
            ui::print_status(Status::Info, &format!("No papers found for \"{}\"", outcome.query));
        }
        OutcomeKind::AllSourcesFailed => {
            ui::print_status(Status::Error, "All sources failed; no results were collected");
        }
    }

    let failed = outcome.failures().count();
    if failed > 0 && !outcome.all_failed() {
        ui::print_status(
            Status::Warning,
            &format!("{} of {} sources failed; results are partial", failed, outcome.reports.len()),
        );
    }
}

fn output_papers(papers: &[Paper], format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            for paper in papers {
                println!("{} - {} ({})", paper.title, paper.authors, paper.source);
                println!("  Date: {}", paper.date);
                println!("  Journal: {}", paper.journal_name);
                println!("  DOI: {}", paper.doi);
                println!("  URL: {}", paper.url);
                println!();
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Source", "Date", "Citations", "DOI"]);

            for paper in papers {
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&paper.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&paper.authors, 30)),
                    Cell::new(paper.source.to_string()),
                    Cell::new(&paper.date),
                    Cell::new(paper.citations),
                    Cell::new(&paper.doi),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Json => {}
    }
}

fn output_sources(config: &Config, format: OutputFormat) {
    let key_state = |source: SourceType| match config.has_api_key(source) {
        Some(true) => "configured",
        Some(false) => "missing",
        None => "not required",
    };

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = SourceType::ALL
                .into_iter()
                .map(|source| {
                    serde_json::json!({
                        "id": source.id(),
                        "name": source.name(),
                        "enabled": config.is_enabled(source),
                        "api_key": key_state(source),
                        "quality_score": source.quality_score(),
                    })
                })
                .collect();
            match serde_json::to_string_pretty(&rows) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize sources: {}", e),
            }
        }
        OutputFormat::Plain => {
            for source in SourceType::ALL {
                println!(
                    "{} - {} (enabled: {}, api key: {})",
                    source.id(),
                    source.name(),
                    config.is_enabled(source),
                    key_state(source)
                );
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Enabled", "API key", "Quality score"]);

            for source in SourceType::ALL {
                table.add_row(vec![
                    Cell::new(format!("{} {}", ui::source_icon(source), source.id())),
                    Cell::new(source.name()),
                    Cell::new(if config.is_enabled(source) { "yes" } else { "no" }),
                    Cell::new(key_state(source)),
                    Cell::new(paper_aggregator::models::format_score(source.quality_score())),
                ]);
            }
            println!("{table}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_values() {
        assert_eq!(OutputFormat::Auto as i32, 0);
        assert_eq!(OutputFormat::Table as i32, 1);
        assert_eq!(OutputFormat::Json as i32, 2);
        assert_eq!(OutputFormat::Plain as i32, 3);
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["paper-aggregator"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.timeout, None);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["paper-aggregator", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["paper-aggregator", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["paper-aggregator", "sources", "--verbose"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_and_output() {
        let cli = Cli::parse_from(["paper-aggregator", "-q", "-o", "json"]);
        assert!(cli.quiet);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["paper-aggregator", "--output", "table"]);
        assert_eq!(cli.output, OutputFormat::Table);
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from([
            "paper-aggregator",
            "--config",
            "/path/to/config.toml",
            "--timeout",
            "60",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
        assert_eq!(cli.timeout, Some(60));
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["paper-aggregator", "search", "machine learning"]);
        match &cli.command {
            Some(Commands::Search {
                query,
                max_results,
                export,
                only,
                ..
            }) => {
                assert_eq!(query, "machine learning");
                assert_eq!(*max_results, None);
                assert!(export.is_none());
                assert!(only.is_empty());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_with_options() {
        let cli = Cli::parse_from([
            "paper-aggregator",
            "search",
            "neural networks",
            "--max-results",
            "10",
            "--year-from",
            "2018",
            "--year-to",
            "2022",
            "--min-quality",
            "0.5",
            "--export",
            "out.csv",
            "--layout",
            "basic",
            "--only",
            "scopus,wos",
        ]);
        match cli.command {
            Some(Commands::Search {
                query,
                max_results,
                year_from,
                year_to,
                min_quality,
                export,
                layout,
                only,
            }) => {
                assert_eq!(query, "neural networks");
                assert_eq!(max_results, Some(10));
                assert_eq!(year_from, Some(2018));
                assert_eq!(year_to, Some(2022));
                assert_eq!(min_quality, Some(0.5));
                assert_eq!(export, Some(PathBuf::from("out.csv")));
                assert_eq!(layout.map(ExportLayout::from), Some(ExportLayout::Basic));
                assert_eq!(only, vec![Source::Scopus, Source::Wos]);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_source() {
        let result = Cli::try_parse_from(["paper-aggregator", "search", "q", "--only", "arxiv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_sources_command() {
        let cli = Cli::parse_from(["paper-aggregator", "sources"]);
        assert!(matches!(cli.command, Some(Commands::Sources)));

        let cli = Cli::parse_from(["paper-aggregator", "ls"]);
        assert!(matches!(cli.command, Some(Commands::Sources)));
    }

    #[test]
    fn test_source_mapping() {
        assert_eq!(SourceType::from(Source::Scopus), SourceType::Scopus);
        assert_eq!(SourceType::from(Source::OpenAlex), SourceType::OpenAlex);
        assert_eq!(SourceType::from(Source::Wos), SourceType::Wos);
    }
}
