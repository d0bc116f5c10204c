use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::repository::Repository;

use crate::cli::OverridesCommand;
use crate::util::resolve_series_id;
use crate::views::table::display_overrides;

pub async fn list_overrides(repo: &impl Repository, actor: &Actor, command: OverridesCommand) -> Result<()> {
    let series_id = resolve_series_id(repo, actor, &command.id).await?;
    let overrides = repo.find_overrides(actor, series_id).await?;
    display_overrides(&overrides);
    Ok(())
}
