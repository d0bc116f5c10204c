use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::ShowCommand;
use crate::util::resolve_series_id;
use crate::views::table::{display_overrides, display_series_details};

pub async fn show_series(repo: &impl Repository, actor: &Actor, command: ShowCommand) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;
    let series = repo.get_series(actor, series_id).await?;

    display_series_details(&series);

    if series.is_recurring() {
        let overrides = repo.find_overrides(actor, series.id).await?;
        if !overrides.is_empty() {
            println!();
            println!("{}", "Edited occurrences".bold());
            display_overrides(&overrides);
        }
    }

    Ok(())
}
