//! task-query CLI - natural-language search over task lists.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use task_query::ai::{create_provider, AIProvider};
use task_query::config::load_config;
use task_query::dates::resolve_date_expression;
use task_query::entities::{QueryConfig, Task};
use task_query::parser::QueryParser;
use task_query::ranking::{filter_tasks, rank_tasks, SortField};
use task_query::source::{JsonFileSource, TaskSource};
use task_query::terms::TermRegistry;
use task_query::ui;

/// Config file looked up in the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "task-query.json";

#[derive(Parser)]
#[command(name = "task-query")]
#[command(about = "Search tasks with natural-language queries", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Never call the language model
    #[arg(long, global = true)]
    offline: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and rank matching tasks
    Search {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Tasks file (JSON)
        #[arg(short, long)]
        tasks: PathBuf,

        /// Sort fields, comma-separated (relevance, due, priority, status)
        #[arg(short, long, value_delimiter = ',')]
        sort: Vec<SortField>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Rank every task instead of only those matching the filters
        #[arg(long)]
        all: bool,
    },

    /// Show how a query is understood
    Parse {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Resolve a date expression to a range
    ResolveDate {
        /// Date expression (today, 2w, last 3 days, next friday, ...)
        #[arg(required = true, num_args = 1..)]
        expression: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn init_tracing(config: &QueryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    init_tracing(&config);

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    match cli.command {
        Commands::Search {
            query,
            tasks,
            sort,
            limit,
            all,
        } => {
            let text = query.join(" ");
            let parser = build_parser(config.clone(), cli.offline, today);
            let parsed = parser.parse(&text).await;

            let source = JsonFileSource::new(&tasks, &config);
            let loaded = source.load_tasks().await?;

            let registry = TermRegistry::from_config(&config);
            let candidates: Vec<Task> = if all {
                loaded
            } else {
                filter_tasks(&loaded, &parsed, &registry, today)
                    .into_iter()
                    .cloned()
                    .collect()
            };

            let mut ranked =
                rank_tasks(&candidates, &parsed, &registry, &config.scoring, &sort, today);
            ranked.truncate(limit);

            if cli.json {
                let output = serde_json::json!({
                    "query": parsed,
                    "results": ranked,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            ui::display_parsed_query(&parsed, &parsed.due_filter(today));
            println!();
            if ranked.is_empty() {
                ui::print_warning("No matching tasks");
            } else {
                println!("{}", ui::ranked_table(&ranked));
                ui::print_info(&format!(
                    "{} of {} task(s) shown",
                    ranked.len(),
                    candidates.len()
                ));
            }
        }

        Commands::Parse { query } => {
            let text = query.join(" ");
            let parser = build_parser(config, cli.offline, today);
            let parsed = parser.parse(&text).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                ui::display_parsed_query(&parsed, &parsed.due_filter(today));
            }
        }

        Commands::ResolveDate { expression } => {
            let expression = expression.join(" ");
            let filter = resolve_date_expression(&expression, today);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&filter)?);
            } else if filter.is_filter() {
                ui::print_success(&format!(
                    "{} {} {}",
                    expression.bold(),
                    "→".dimmed(),
                    ui::describe_date_filter(&filter)
                ));
            } else {
                ui::print_warning(&format!("'{}' is not a recognized date expression", expression));
            }
        }
    }

    Ok(())
}

/// Build a parser; provider problems only disable the model path.
fn build_parser(config: QueryConfig, offline: bool, today: NaiveDate) -> QueryParser {
    let provider: Option<Arc<dyn AIProvider>> = if offline {
        None
    } else {
        match create_provider(&config.model) {
            Ok(provider) if provider.is_configured() => Some(provider),
            Ok(provider) => {
                tracing::warn!(
                    provider = provider.name(),
                    env = provider.api_key_env_var().unwrap_or_default(),
                    "Model provider has no API key, using keyword search"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not create model provider, using keyword search");
                None
            }
        }
    };

    QueryParser::new(config, provider).with_today(today)
}
