use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::repository::Repository;
use cadence_core::validation::validate_window;

use crate::cli::OccurrencesCommand;
use crate::parser::parse_instant;
use crate::views::table::display_occurrences;

pub async fn list_occurrences(repo: &impl Repository, actor: &Actor, command: OccurrencesCommand) -> Result<()> {
    let window = validate_window(parse_instant(&command.from)?, parse_instant(&command.to)?)?;
    let occurrences = repo.find_occurrences(actor, window).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        display_occurrences(&occurrences);
    }

    Ok(())
}
