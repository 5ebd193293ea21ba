//! lql
//!
//! Command-line front end for the Livestatus engine:
//! - Answer LQL requests against a store snapshot
//! - Import log history into the SQLite log store
//! - Print a default configuration file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use livestatus::config::{generate_default_config, LoggingConfig};
use livestatus::{
    Config, LiveStatus, LogLine, MemoryStore, RequestOutcome, Response, SqliteLogStore,
};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between two checks of a wait condition
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "lql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Answer Livestatus Query Language requests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log history database (overrides the config file)
    #[arg(long, global = true)]
    pub log_db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer one request
    Query {
        /// Store snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Request file, or - for stdin
        #[arg(default_value = "-")]
        request: String,
    },

    /// Import log lines (one JSON object per line) into the log store
    ImportLog {
        /// JSON lines file, or - for stdin
        #[arg(default_value = "-")]
        path: String,
        /// Purge lines older than the configured maximum age afterwards
        #[arg(long)]
        purge: bool,
    },

    /// Print a default configuration file
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(path) = &cli.log_db {
        config.logstore.database_file = path.to_string_lossy().to_string();
    }

    init_logging(&config.logging)?;

    match cli.command {
        Commands::Query { snapshot, request } => {
            let response = run_query(&config, &snapshot, &request)?;
            print!("{}", response.body);
            std::io::stdout().flush()?;
            if !response.is_ok() {
                std::process::exit(1);
            }
        }
        Commands::ImportLog { path, purge } => import_log(&config, &path, purge)?,
        Commands::Config => print!("{}", generate_default_config()),
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("livestatus={},lql={}", logging.level, logging.level).into());

    // Logs go to stderr (or the configured file) so that response bodies
    // stay clean on stdout
    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}

fn read_input(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading request from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))
    }
}

fn open_log_store(config: &Config) -> anyhow::Result<Option<SqliteLogStore>> {
    let path = Path::new(&config.logstore.database_file);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No log database, log table will be empty");
        return Ok(None);
    }
    let store = SqliteLogStore::open(path)
        .with_context(|| format!("opening log database {}", path.display()))?;
    Ok(Some(store))
}

fn run_query(config: &Config, snapshot: &Path, source: &str) -> anyhow::Result<Response> {
    let store = MemoryStore::load(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    tracing::info!(snapshot = %snapshot.display(), "Loaded store snapshot");

    let mut engine = LiveStatus::new(Arc::new(store)).with_config(config.livestatus.clone());
    if let Some(log_store) = open_log_store(config)? {
        engine = engine.with_log_store(Arc::new(log_store));
    }

    let text = read_input(source)?;
    match engine.handle_request(&text) {
        RequestOutcome::Response(response) => Ok(response),
        RequestOutcome::Wait { wait, query } => {
            // Snapshots never change, so the wait ends on the first
            // fulfilled check or when the timeout runs out
            let deadline = Instant::now() + wait.timeout;
            loop {
                match engine.wait_fulfilled(&wait) {
                    Ok(true) => break,
                    Ok(false) if Instant::now() >= deadline => {
                        tracing::debug!(timeout = wait.timeout_secs(), "Wait timed out");
                        break;
                    }
                    Ok(false) => std::thread::sleep(WAIT_POLL_INTERVAL),
                    Err(e) => {
                        tracing::warn!(error = %e, "Wait condition failed");
                        break;
                    }
                }
            }
            Ok(engine.answer(&query))
        }
    }
}

fn import_log(config: &Config, source: &str, purge: bool) -> anyhow::Result<()> {
    let path = Path::new(&config.logstore.database_file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = SqliteLogStore::open(path)
        .with_context(|| format!("opening log database {}", path.display()))?;

    let text = read_input(source)?;
    let mut imported = 0usize;
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: LogLine = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => bail!("line {}: {}", number + 1, e),
        };
        store.insert(&entry)?;
        imported += 1;
    }
    tracing::info!(imported, path = %path.display(), "Imported log lines");

    if purge {
        store.purge_older_than(config.logstore.max_logs_age_days)?;
    }
    println!("Imported {} log lines ({} total)", imported, store.count()?);
    Ok(())
}
