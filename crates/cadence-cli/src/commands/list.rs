use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::models::ListScope;
use cadence_core::repository::Repository;

use crate::cli::ListCommand;
use crate::views::table::display_series;

pub async fn list_series(repo: &impl Repository, actor: &Actor, command: ListCommand) -> Result<()> {
    let scope = if command.mine { ListScope::Mine } else { ListScope::Visible };
    let series = repo.list_series(actor, scope).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        display_series(&series);
    }

    Ok(())
}
