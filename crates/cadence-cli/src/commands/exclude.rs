use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::ExcludeCommand;
use crate::parser::parse_instant;
use crate::util::resolve_series_id;

pub async fn exclude_occurrence(repo: &impl Repository, actor: &Actor, command: ExcludeCommand) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;
    let anchor = parse_instant(&command.at)?;

    let newly_excluded = repo.exclude_occurrence(actor, series_id, anchor).await?;

    let stamp = anchor.format("%Y-%m-%d %H:%M").to_string();
    if newly_excluded {
        println!(
            "{} Removed occurrence at {}",
            "✓".style(Style::new().green().bold()),
            stamp.yellow()
        );
    } else {
        println!("Occurrence at {} was already removed.", stamp.yellow());
    }

    Ok(())
}
