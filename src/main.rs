use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use indicatif::ProgressBar;
use tokio::sync::mpsc;

use searchbox::config::AppConfig;
use searchbox::core::error::SearchError;
use searchbox::core::logging;
use searchbox::core::models::{SearchResult, Suggestion};
use searchbox::core::orchestrator::ChannelState;
use searchbox::{RequestTicket, SearchEvent, SearchOrchestrator, SearchOrchestratorBuilder};

/// Command-line arguments accepted by the `searchbox` binary.
#[derive(Parser, Debug)]
#[command(
    name = "searchbox",
    version,
    about = "Query a search backend the way a search box would"
)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SEARCHBOX_CONFIG",
        global = true,
        help = "Configuration file (default: <config dir>/searchbox/config.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v debug, -vv trace)"
    )]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a search and print the results
    Search {
        query: String,
        #[arg(short = 'C', long, help = "Restrict the search to a category")]
        category: Option<String>,
        #[arg(long, help = "Use AI-augmented search")]
        ai: bool,
        #[arg(long, requires = "ai", help = "Extra context for the AI provider")]
        context: Option<String>,
        #[arg(long, help = "Print the raw response as JSON")]
        json: bool,
    },
    /// Fetch autocomplete suggestions for a partial query
    Suggest {
        query: String,
        #[arg(short = 'C', long, help = "Restrict suggestions to a category")]
        category: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        let report = miette::miette!("{:#}", e);
        eprintln!("{:?}", report);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => AppConfig::load(),
    };

    match cli.verbose {
        0 => {}
        1 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }
    let _log_guard = logging::init(&config.logging);
    log::debug!("{} v{} starting", searchbox::NAME, searchbox::VERSION);

    match cli.command {
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Suggest { query, category } => suggest(&config, &query, category).await,
        Command::Search {
            query,
            category,
            ai,
            context,
            json,
        } => search(&config, &query, category, ai, context, json).await,
    }
}

fn build(
    config: &AppConfig,
) -> anyhow::Result<(SearchOrchestrator, mpsc::UnboundedReceiver<SearchEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = SearchOrchestratorBuilder::from_app_config(config)
        .with_events(Arc::new(tx))
        .build()?;
    Ok((orchestrator, rx))
}

async fn wait(ticket: RequestTicket, message: String) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(logging::spinner_style());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));

    ticket.finished().await;

    spinner.finish_and_clear();
}

async fn suggest(config: &AppConfig, query: &str, category: Option<String>) -> anyhow::Result<()> {
    let (orchestrator, mut events) = build(config)?;
    if let Some(category) = category {
        orchestrator.set_category(&category);
    }

    let Some(ticket) = orchestrator.fetch_suggestions(query) else {
        bail!(SearchError::QueryTooShort {
            min: config.search.min_query_length
        }
        .user_message());
    };
    wait(ticket, format!("Suggestions for {}", style(query).bold())).await;

    while let Ok(event) = events.try_recv() {
        match event {
            SearchEvent::Suggestions { suggestions, .. } => print_suggestions(&suggestions),
            SearchEvent::AutocompleteError(message) => bail!(message),
            _ => {}
        }
    }
    Ok(())
}

async fn search(
    config: &AppConfig,
    query: &str,
    category: Option<String>,
    ai: bool,
    context: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let (orchestrator, _events) = build(config)?;
    if let Some(category) = category {
        orchestrator.set_category(&category);
    }

    let ticket = if ai {
        orchestrator.submit_ai_search(query, context.as_deref())
    } else {
        orchestrator.submit_search(query)
    };

    let Some(ticket) = ticket else {
        let state = orchestrator.snapshot();
        if let Some(error) = state.ai_search.error {
            bail!(error);
        }
        bail!(SearchError::QueryTooShort {
            min: config.search.min_search_length
        }
        .user_message());
    };
    let channel = ticket.channel();
    wait(ticket, format!("Searching for {}", style(query).bold())).await;

    let state = orchestrator.snapshot();
    orchestrator.shutdown();

    if ai {
        report(&state.ai_search, json, |response| {
            print_results(&response.results);
            if let Some(explanation) = &response.ai_explanation {
                println!("\n{} {}", style("AI:").magenta().bold(), explanation);
            }
        })
    } else {
        log::debug!("{} request finished", channel);
        report(&state.search, json, |response| {
            print_results(&response.results);
            if let Some(message) = &response.message {
                println!("\n{}", style(message).dim());
            }
        })
    }
}

fn report<T: serde::Serialize>(
    channel: &ChannelState<T>,
    json: bool,
    print: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if let Some(error) = &channel.error {
        bail!(error.clone());
    }
    match &channel.data {
        Some(data) if json => println!("{}", serde_json::to_string_pretty(data)?),
        Some(data) => print(data),
        None => println!("{}", style("No results").dim()),
    }
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("{}", style("No results").dim());
        return;
    }

    for result in results {
        let kind = if result.kind.is_empty() {
            String::new()
        } else {
            format!(" [{}]", result.kind)
        };
        println!("{}{}", style(&result.title).bold(), style(kind).cyan());
        if let Some(description) = &result.description {
            println!("    {}", description);
        }
        if !result.url.is_empty() {
            println!("    {}", style(&result.url).dim().underlined());
        }
    }
}

fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("{}", style("No suggestions").dim());
        return;
    }

    for suggestion in suggestions {
        match &suggestion.kind {
            Some(kind) => println!("{}  {}", suggestion.text, style(kind).dim()),
            None => println!("{}", suggestion.text),
        }
    }
}
