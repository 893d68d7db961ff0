use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stint_cli::commands::{history, init, start, stats, status, stop, todo, transition};
use stint_cli::{Cli, Commands, Config, TodoAction};
use stint_core::{Mode, TodoId, UserId};
use stint_db::SegmentFilter;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(stint_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = stint_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Init = command {
        let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
        return init::run(&mut stdout, &config);
    }

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let user = UserId::new(cli.user.clone().unwrap_or_else(|| config.user.clone()))?;
    let offset = config
        .reporting_offset()
        .context("utc_offset_minutes is out of range")?;

    match command {
        Commands::Init => unreachable!("handled above"),
        Commands::Todo { action } => match action {
            TodoAction::Add { title, priority } => {
                todo::add(&mut stdout, &mut db, &user, title, *priority)?;
            }
            TodoAction::List => todo::list(&mut stdout, &db, &user)?,
            TodoAction::Done { todo_id } => {
                let todo_id = TodoId::new(todo_id.clone())?;
                todo::done(&mut stdout, &mut db, &user, &todo_id)?;
            }
        },
        Commands::Start { todo_id } => {
            let todo_id = TodoId::new(todo_id.clone())?;
            start::run(&mut stdout, &mut db, &user, &todo_id)?;
        }
        Commands::Pause { reason } => {
            transition::run(&mut stdout, &mut db, &user, Mode::Pause, *reason)?;
        }
        Commands::Break { reason } => {
            transition::run(&mut stdout, &mut db, &user, Mode::Break, *reason)?;
        }
        Commands::Resume { reason } => {
            transition::run(&mut stdout, &mut db, &user, Mode::Focus, *reason)?;
        }
        Commands::Stop => stop::run(&mut stdout, &mut db, &user)?,
        Commands::Status => status::run(&mut stdout, &db, &user)?,
        Commands::History {
            date,
            start: range_start,
            end,
            mode,
            reason,
            todo,
        } => {
            if let Some(date) = date {
                history::daily(&mut stdout, &db, &user, *date, offset)?;
            } else {
                let filter = SegmentFilter {
                    mode: *mode,
                    reason: *reason,
                    start_date: *range_start,
                    end_date: *end,
                    todo_id: todo.clone().map(TodoId::new).transpose()?,
                };
                history::range(&mut stdout, &db, &user, &filter, offset)?;
            }
        }
        Commands::Stats => stats::run(&mut stdout, &db, &user, offset)?,
    }

    Ok(())
}
