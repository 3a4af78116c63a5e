//! Command-line access to stage databases.
//!
//! # Responsibility
//! - Prepare and copy stage files outside the test runner.
//! - Run ad-hoc queries and print row mappings as JSON.

use clap::{Parser, Subcommand};
use log::{error, info};
use movies_core::{
    core_version, flush_logging, init_logging, latest_version, Database, DbError, FixtureStore,
    HarnessConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "movies")]
#[command(about = "Prepare movies fixture stages and query them")]
#[command(version)]
struct Cli {
    /// Directory holding `<stage>.db` files
    #[arg(long, global = true)]
    fixture_dir: Option<PathBuf>,

    /// Per-query timeout in seconds (0 disables)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a stage file from the fixture scripts
    Prepare {
        stage: String,
        /// Fixture version to build up to (defaults to latest)
        #[arg(long)]
        version: Option<u32>,
    },
    /// Copy one stage file into another
    Copy { from: String, to: String },
    /// Run a query against a stage and print rows as JSON
    Query {
        stage: String,
        sql: String,
        /// Print only the first row (or null)
        #[arg(long)]
        single: bool,
    },
    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => {
            info!("event=cli_exit module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(
                "event=cli_exit module=cli status=error error_code={}",
                error_code(&*err)
            );
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    };
    flush_logging();
    code
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let store = FixtureStore::new(&config.fixture_dir);
    match cli.command {
        Commands::Prepare { stage, version } => {
            let path = store.prepare_to(&stage, version.unwrap_or_else(latest_version))?;
            println!("{}", path.display());
        }
        Commands::Copy { from, to } => {
            let path = store.copy_stage(&from, &to)?;
            println!("{}", path.display());
        }
        Commands::Query { stage, sql, single } => {
            let mut db = Database::open_stage(&store, &stage)?;
            db.set_query_timeout(config.query_timeout);
            let output = if single {
                serde_json::to_string_pretty(&db.select_single_row(&sql)?)?
            } else {
                serde_json::to_string_pretty(&db.select_multiple_rows(&sql)?)?
            };
            println!("{output}");
        }
        Commands::Version => {
            println!("movies_core version={}", core_version());
        }
    }
    Ok(())
}

/// Text-free code for the `cli_exit` event.
fn error_code(err: &(dyn Error + 'static)) -> &'static str {
    err.downcast_ref::<DbError>().map_or("cli_error", DbError::code)
}

fn resolve_config(cli: &Cli) -> Result<HarnessConfig, Box<dyn Error>> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(dir) = &cli.fixture_dir {
        config.fixture_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.query_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}
