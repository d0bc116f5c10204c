use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::models::SeriesInput;
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::parse_instant;
use crate::views::table::describe_recurrence;

pub async fn add_series(repo: &impl Repository, actor: &Actor, command: AddCommand) -> Result<()> {
    let input = SeriesInput {
        title: command.title,
        description: command.description,
        start: parse_instant(&command.start)?,
        end: parse_instant(&command.end)?,
        recurrence: command.every,
        count: command.count,
        until: command.until.as_deref().map(parse_instant).transpose()?,
    };

    let series = repo.create_series(actor, input).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if series.is_recurring() {
        println!(
            "{} Created series: {}",
            "✓".style(success_style),
            series.title.bright_white().bold()
        );
        println!(
            "  {} Repeats {}",
            "→".style(info_style),
            describe_recurrence(&series.recurrence)
        );
    } else {
        println!(
            "{} Created event: {}",
            "✓".style(success_style),
            series.title.bright_white().bold()
        );
    }
    println!("  {} Series ID: {}", "→".style(info_style), series.id.to_string().yellow());

    Ok(())
}
