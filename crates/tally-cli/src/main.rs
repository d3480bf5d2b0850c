use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{
    Session, delete, edit, log, pause, report, resume, start, status, stop,
};
use tally_cli::prompt::Prompt;
use tally_cli::signal::signal_source;
use tally_cli::{Cli, Commands, Config};
use tally_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let signals = signal_source(config.gap_source);
    let mut session = Session {
        db: &mut db,
        signals: signals.as_ref(),
        now: Utc::now(),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut prompt = Prompt::new(io::stdin().lock());

    match command {
        Commands::Start(args) => start::run(&mut out, &mut session, args)?,
        Commands::Stop => stop::run(&mut out, &mut session)?,
        Commands::Pause(args) => pause::run(&mut out, &mut session, args)?,
        Commands::Resume(args) => resume::run(&mut out, &mut session, &mut prompt, args)?,
        Commands::Status => status::run(&mut out, &mut session)?,
        Commands::Log(args) => log::run(&mut out, &session, args)?,
        Commands::Report(args) => report::run(&mut out, &session, &mut prompt, args)?,
        Commands::Edit(args) => edit::run(&mut out, &mut session, &config.editor_command(), args)?,
        Commands::Delete(args) => delete::run(&mut out, &mut session, &mut prompt, args)?,
    }

    Ok(())
}
