use cadence_core::db;
use cadence_core::error::CoreError;
use cadence_core::repository::SqliteRepository;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;
use util::IdError;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool, config.engine.clone());
    let actor = config.actor();
    tracing::debug!(actor_id = %actor.id, role = %actor.role, command = ?cli.command, "dispatching");

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_series(&repository, &actor, command).await,
        cli::Commands::List(command) => commands::list::list_series(&repository, &actor, command).await,
        cli::Commands::Show(command) => commands::show::show_series(&repository, &actor, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_series(&repository, &actor, command).await,
        cli::Commands::Delete(command) => {
            commands::delete::delete_series(&repository, &actor, command).await
        }
        cli::Commands::Occurrences(command) => {
            commands::occurrences::list_occurrences(&repository, &actor, command).await
        }
        cli::Commands::Exclude(command) => {
            commands::exclude::exclude_occurrence(&repository, &actor, command).await
        }
        cli::Commands::EditOccurrence(command) => {
            commands::edit_occurrence::edit_occurrence(&repository, &actor, command).await
        }
        cli::Commands::Overrides(command) => {
            commands::overrides::list_overrides(&repository, &actor, command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::Forbidden(s) => {
                eprintln!("{} Not allowed: {}", "Error:".style(error_style), s);
            }
            CoreError::Conflict(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
                eprintln!("The series was changed concurrently; try again.");
            }
            CoreError::Database(e) => {
                eprintln!("{} Database error: {}", "Error:".style(error_style), e);
            }
            CoreError::Migration(e) => {
                eprintln!("{} Migration error: {}", "Error:".style(error_style), e);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), core_error),
        }
    } else if let Some(IdError::Ambiguous { prefix, candidates }) = err.downcast_ref::<IdError>() {
        eprintln!(
            "{} Ambiguous ID prefix '{}'.",
            "Error:".style(error_style),
            prefix.yellow()
        );
        eprintln!("Did you mean one of these?");
        for (id, title) in candidates {
            eprintln!("  {} ({})", id.yellow(), title);
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
