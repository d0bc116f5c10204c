use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::repository::Repository;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::util::resolve_series_id;

pub async fn delete_series(repo: &impl Repository, actor: &Actor, command: DeleteCommand) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;
    let series = repo.get_series(actor, series_id).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Delete '{}' and all of its edited occurrences?",
                series.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    repo.delete_series(actor, series.id).await?;
    println!(
        "{} Deleted series: {}",
        "✓".style(Style::new().green().bold()),
        series.title
    );
    Ok(())
}
