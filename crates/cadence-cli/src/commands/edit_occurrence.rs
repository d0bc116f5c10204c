use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::models::OccurrenceEdit;
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditOccurrenceCommand;
use crate::parser::parse_instant;
use crate::util::{resolve_override_id, resolve_series_id};

pub async fn edit_occurrence(
    repo: &impl Repository,
    actor: &Actor,
    command: EditOccurrenceCommand,
) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };
    let edit = OccurrenceEdit {
        title: command.title,
        description,
        start: parse_instant(&command.start)?,
        end: parse_instant(&command.end)?,
    };

    let record = match (command.override_id, command.at) {
        (Some(override_id), _) => {
            let override_id = resolve_override_id(repo, actor, series_id, &override_id).await?;
            repo.edit_override(actor, series_id, override_id, edit).await?
        }
        (None, Some(at)) => {
            let anchor = parse_instant(&at)?;
            repo.edit_occurrence(actor, series_id, anchor, edit).await?
        }
        (None, None) => anyhow::bail!("Either --at or --override must be provided"),
    };

    let info_style = Style::new().blue();
    println!(
        "{} Edited occurrence of {}",
        "✓".style(Style::new().green().bold()),
        record.anchor.format("%Y-%m-%d %H:%M").to_string().yellow()
    );
    println!(
        "  {} Now {} to {}",
        "→".style(info_style),
        record.start.format("%Y-%m-%d %H:%M"),
        record.end.format("%Y-%m-%d %H:%M")
    );
    println!("  {} Override ID: {}", "→".style(info_style), record.id.to_string().yellow());

    Ok(())
}
