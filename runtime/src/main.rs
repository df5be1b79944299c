use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pagesure_runtime::cli;
use pagesure_runtime::config::RuntimeConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pagesure=info,pagesure_runtime=info";

#[derive(Parser)]
#[command(name = "pagesure", version, about = "Facebook page scraper and review API")]
struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long, short)]
        port: Option<u16>,
        /// Scrapes allowed to run at once
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Append a JSONL record of every scrape to this file
        #[arg(long)]
        audit_log: Option<PathBuf>,
        /// Chromium binary
        #[arg(long)]
        chromium: Option<PathBuf>,
    },
    /// Scrape one page and print its record
    Scrape {
        url: String,
        /// Navigation timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        chromium: Option<PathBuf>,
    },
    /// List category buckets
    Categories {
        #[arg(long)]
        search: Option<String>,
    },
    /// Check the environment
    Doctor,
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if args.json {
        std::env::set_var("PAGESURE_JSON", "1");
    }
    if args.quiet {
        std::env::set_var("PAGESURE_QUIET", "1");
    }

    if let Err(e) = run(args).await {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({ "error": format!("{e:#}") }));
        } else {
            eprintln!("  {} {e:#}", cli::output::Styled::new().fail_sym());
        }
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let mut config = RuntimeConfig::from_env()?;
    init_tracing(config.log_json);

    match args.command {
        Command::Serve {
            bind,
            port,
            max_concurrent,
            db,
            audit_log,
            chromium,
        } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(n) = max_concurrent {
                config.max_concurrent_scrapes = n.max(1);
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if audit_log.is_some() {
                config.audit_log = audit_log;
            }
            if chromium.is_some() {
                config.chromium_path = chromium;
            }
            cli::serve::run(config).await
        }
        Command::Scrape {
            url,
            timeout_ms,
            chromium,
        } => {
            if let Some(ms) = timeout_ms {
                config.nav_timeout_ms = ms;
            }
            if chromium.is_some() {
                config.chromium_path = chromium;
            }
            cli::scrape_cmd::run(&config, &url).await
        }
        Command::Categories { search } => {
            cli::categories_cmd::run(search.as_deref());
            Ok(())
        }
        Command::Doctor => cli::doctor::run(&config),
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pagesure", &mut std::io::stdout());
            Ok(())
        }
    }
}
