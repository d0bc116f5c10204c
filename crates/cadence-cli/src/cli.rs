use cadence_core::models::RecurrenceKind;
use clap::{Parser, Subcommand};

/// Cadence: recurring events with per-occurrence exclusions and edits
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new event or recurring series
    Add(AddCommand),
    /// List series
    List(ListCommand),
    /// Show a series and its overrides
    Show(ShowCommand),
    /// Replace the fields of a series
    Edit(EditCommand),
    /// Delete a series and all of its overrides
    Delete(DeleteCommand),
    /// List occurrences in a time window
    Occurrences(OccurrencesCommand),
    /// Remove a single occurrence from a recurring series
    Exclude(ExcludeCommand),
    /// Move or retitle a single occurrence of a recurring series
    EditOccurrence(EditOccurrenceCommand),
    /// List the edited occurrences of a series
    Overrides(OverridesCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the event
    pub title: String,
    /// The description of the event
    #[arg(short, long)]
    pub description: Option<String>,
    /// When the (first) occurrence starts
    #[arg(short, long)]
    pub start: String,
    /// When the (first) occurrence ends
    #[arg(short, long)]
    pub end: String,
    /// Repeat rule
    #[arg(long, default_value_t = RecurrenceKind::None, help = "Repeat rule (none, daily, weekly, monthly)")]
    pub every: RecurrenceKind,
    /// Total number of occurrences
    #[arg(long, conflicts_with = "until", help = "Total number of occurrences (1-365)")]
    pub count: Option<i64>,
    /// Last instant an occurrence may start at
    #[arg(long, help = "Last date/time an occurrence may start at")]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only series owned by the current actor
    #[arg(long)]
    pub mine: bool,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long, help = "Repeat rule (none, daily, weekly, monthly)")]
    pub every: Option<RecurrenceKind>,
    #[arg(long, conflicts_with = "until", help = "Total number of occurrences (1-365)")]
    pub count: Option<i64>,
    #[arg(long, help = "Last date/time an occurrence may start at")]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrencesCommand {
    /// Window start (inclusive)
    #[arg(long)]
    pub from: String,
    /// Window end (inclusive)
    #[arg(long)]
    pub to: String,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExcludeCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,
    /// Original start of the occurrence to remove
    #[arg(long)]
    pub at: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditOccurrenceCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,

    /// Original start of the occurrence to edit
    #[arg(long, required_unless_present = "override_id", conflicts_with = "override_id")]
    pub at: Option<String>,
    /// Edit an existing override by its ID instead of by anchor
    #[arg(long = "override")]
    pub override_id: Option<String>,

    /// New start of the occurrence
    #[arg(long)]
    pub start: String,
    /// New end of the occurrence
    #[arg(long)]
    pub end: String,

    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OverridesCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_edit_occurrence_needs_a_target() {
        let interval = ["--start", "2024-01-09T14:00:00Z", "--end", "2024-01-09T15:00:00Z"];
        let parse = |extra: &[&str]| {
            let mut args = vec!["cadence", "edit-occurrence", "abc"];
            args.extend_from_slice(extra);
            args.extend_from_slice(&interval);
            Cli::try_parse_from(args)
        };

        assert!(parse(&[]).is_err());
        assert!(parse(&["--at", "2024-01-08"]).is_ok());
        assert!(parse(&["--override", "def"]).is_ok());
        assert!(parse(&["--at", "2024-01-08", "--override", "def"]).is_err());
    }

    #[test]
    fn test_edit_occurrence_needs_an_interval() {
        assert!(Cli::try_parse_from([
            "cadence", "edit-occurrence", "abc", "--at", "2024-01-08", "--title", "Renamed"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "cadence", "edit-occurrence", "abc", "--at", "2024-01-08", "--start", "2024-01-09T14:00:00Z"
        ])
        .is_err());
    }

    #[test]
    fn test_add_parses_recurrence() {
        let cli = Cli::try_parse_from([
            "cadence", "add", "Standup", "--start", "2024-01-01T10:00:00Z", "--end",
            "2024-01-01T11:00:00Z", "--every", "weekly", "--count", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(add) => {
                assert_eq!(add.every, RecurrenceKind::Weekly);
                assert_eq!(add.count, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
