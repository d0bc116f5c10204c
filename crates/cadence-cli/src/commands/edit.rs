use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::models::{RecurrenceKind, Series, SeriesInput};
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::parser::parse_instant;
use crate::util::resolve_series_id;

pub async fn edit_series(repo: &impl Repository, actor: &Actor, command: EditCommand) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;
    let current = repo.get_series(actor, series_id).await?;

    let input = merge_edit(&current, command)?;
    let updated = repo.update_series(actor, current.id, input).await?;

    println!(
        "{} Updated series: {}",
        "✓".style(Style::new().green().bold()),
        updated.title.bright_white().bold()
    );
    Ok(())
}

/// Fills every field the command leaves out from the current series.
///
/// When neither `--count` nor `--until` is given, a recurring result keeps the
/// current bound. Switching to `none` drops it.
fn merge_edit(current: &Series, command: EditCommand) -> Result<SeriesInput> {
    let recurrence = command.every.unwrap_or_else(|| current.recurrence.kind());

    let description = if command.description_clear {
        None
    } else {
        command.description.or_else(|| current.description.clone())
    };

    let until = command.until.as_deref().map(parse_instant).transpose()?;
    let (count, until) = match (command.count, until) {
        (None, None) if recurrence != RecurrenceKind::None => (
            current.recurrence.count().map(i64::from),
            current.recurrence.until(),
        ),
        other => other,
    };

    Ok(SeriesInput {
        title: command.title.unwrap_or_else(|| current.title.clone()),
        description,
        start: command.start.as_deref().map(parse_instant).transpose()?.unwrap_or(current.start),
        end: command.end.as_deref().map(parse_instant).transpose()?.unwrap_or(current.end),
        recurrence,
        count,
        until,
    })
}
