use anyhow::Context;
use append::Outcome;
use clap::CommandFactory;
use cli::{Cli, Command, SearchArgs};
use config::{Access, Journal};
use entries::Header;
use error::LogError;
use search::SearchTarget;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod append;
mod cli;
mod config;
mod entries;
mod error;
mod search;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args(std::env::args_os()).unwrap_or_else(|err| err.exit());

    setup_logging();

    let config_dir = cli.config_dir;

    match cli.command.unwrap_or(Command::LogFull { extra: Vec::new() }) {
        Command::Help { .. } => Cli::command().print_help()?,
        Command::LogFull { extra } => {
            if !extra.is_empty() {
                eprintln!("Ignoring arguments after 'log': {}", extra.join(" "));
            }

            let mut journal = open_journal(&resolve_dir(config_dir)?, Access::Append)?;
            let header = Header::now().context("Could not obtain current working directory")?;

            let outcome = append::log_entry(io::stdin().lock(), journal.log(), header)
                .context("Failed to write log entry")?;

            if outcome == Outcome::NothingLogged {
                println!("Nothing logged.");
            }
        }
        Command::Oneliner(words) => {
            let mut journal = open_journal(&resolve_dir(config_dir)?, Access::Append)?;
            let header = Header::now().context("Could not obtain current working directory")?;

            append::log_oneline(&words, journal.log(), header)
                .context("Failed to write log entry")?;
        }
        Command::Date(args) => run_search(&resolve_dir(config_dir)?, SearchTarget::Date, args)?,
        Command::Dir(args) => {
            run_search(&resolve_dir(config_dir)?, SearchTarget::Directory, args)?
        }
        Command::Body(args) => run_search(&resolve_dir(config_dir)?, SearchTarget::Body, args)?,
    }

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

/// `--config-dir` if given, otherwise the platform default.
fn resolve_dir(config_dir: Option<PathBuf>) -> Result<PathBuf, LogError> {
    match config_dir {
        Some(dir) => Ok(dir),
        None => config::default_dir(),
    }
}

fn open_journal(dir: &Path, access: Access) -> anyhow::Result<Journal> {
    let journal = Journal::open(dir, access).context("Failed to set up configuration files")?;

    debug!(
        version = %journal.settings().version,
        "Using journal in {}",
        journal.dir().display()
    );

    Ok(journal)
}

/// Prints every matching record to stdout as it is found.
fn run_search(dir: &Path, target: SearchTarget, args: SearchArgs) -> anyhow::Result<()> {
    let journal = open_journal(dir, Access::Read)?;

    let Some(pattern) = args.pattern else {
        eprintln!("{}", LogError::MissingPattern);
        return Ok(());
    };

    if !args.extra.is_empty() {
        eprintln!("Too many regular expressions. Will only consider first");
    }

    let matches = search::search(journal.into_reader(), target, &pattern)?;
    let mut stdout = io::stdout().lock();

    for entry in matches {
        let entry = entry.context("Failed to read log file")?;

        write!(stdout, "{entry}")?;
        stdout.flush()?;
    }

    Ok(())
}
