use cadence_core::models::{Occurrence, Override, Recurrence, RecurrenceBound, Series};
use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use comfy_table::{Attribute, Cell, Color, Row, Table};

use crate::util::short_id;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn format_time(instant: DateTime<Utc>) -> String {
    instant.format(TIME_FORMAT).to_string()
}

pub fn describe_recurrence(recurrence: &Recurrence) -> String {
    match recurrence {
        Recurrence::None => "once".to_string(),
        Recurrence::Repeating { bound, .. } => {
            let kind = recurrence.kind();
            match bound {
                RecurrenceBound::Count(count) => format!("{}, {} times", kind, count),
                RecurrenceBound::Until(until) => format!("{} until {}", kind, format_time(*until)),
            }
        }
    }
}

pub fn display_series(series: &[Series]) {
    if series.is_empty() {
        println!("No series found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Start", "End", "Repeats", "Excluded"]);

    for item in series {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(item.id)));

        let mut title = String::new();
        if item.is_recurring() {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&item.title);
        row.add_cell(Cell::new(title).add_attribute(Attribute::Bold));

        row.add_cell(Cell::new(format_time(item.start)));
        row.add_cell(Cell::new(format_time(item.end)));
        row.add_cell(Cell::new(describe_recurrence(&item.recurrence)));
        row.add_cell(Cell::new(item.exclusions.len()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_occurrences(occurrences: &[Occurrence]) {
    if occurrences.is_empty() {
        println!("No occurrences in this window.");
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_header(vec!["Series", "Start", "End", "Title", "When", "Kind"]);

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(occurrence.logical_event_id)));
        row.add_cell(Cell::new(format_time(occurrence.start)));
        row.add_cell(Cell::new(format_time(occurrence.end)));
        row.add_cell(Cell::new(&occurrence.title));

        let when = HumanTime::from(occurrence.start - now).to_string();
        let when_cell = if occurrence.end < now {
            Cell::new(when).fg(Color::DarkGrey)
        } else {
            Cell::new(when)
        };
        row.add_cell(when_cell);

        let kind = if occurrence.is_override {
            Cell::new(format!("edited (was {})", format_time(occurrence.anchor))).fg(Color::Yellow)
        } else if occurrence.derived_from_base {
            Cell::new("series")
        } else {
            Cell::new("single")
        };
        row.add_cell(kind);
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_overrides(overrides: &[Override]) {
    if overrides.is_empty() {
        println!("No edited occurrences.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Original start", "Start", "End", "Title", "Description"]);

    for record in overrides {
        let mut row = Row::new();
        row.add_cell(Cell::new(record.id));
        row.add_cell(Cell::new(format_time(record.anchor)));
        row.add_cell(Cell::new(format_time(record.start)).fg(Color::Yellow));
        row.add_cell(Cell::new(format_time(record.end)));
        row.add_cell(Cell::new(&record.title));
        row.add_cell(Cell::new(record.description.as_deref().unwrap_or("")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_series_details(series: &Series) {
    let mut table = Table::new();
    table.add_row(vec![Cell::new("ID").add_attribute(Attribute::Bold), Cell::new(series.id)]);
    table.add_row(vec![Cell::new("Title").add_attribute(Attribute::Bold), Cell::new(&series.title)]);
    table.add_row(vec![
        Cell::new("Description").add_attribute(Attribute::Bold),
        Cell::new(series.description.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Start").add_attribute(Attribute::Bold),
        Cell::new(format_time(series.start)),
    ]);
    table.add_row(vec![
        Cell::new("End").add_attribute(Attribute::Bold),
        Cell::new(format_time(series.end)),
    ]);
    table.add_row(vec![
        Cell::new("Repeats").add_attribute(Attribute::Bold),
        Cell::new(describe_recurrence(&series.recurrence)),
    ]);

    let excluded: Vec<String> = series.exclusions.iter().map(format_time).collect();
    table.add_row(vec![
        Cell::new("Excluded").add_attribute(Attribute::Bold),
        Cell::new(if excluded.is_empty() { "-".to_string() } else { excluded.join("\n") }),
    ]);
    table.add_row(vec![Cell::new("Owner").add_attribute(Attribute::Bold), Cell::new(series.owner_id)]);

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::models::Frequency;
    use chrono::TimeZone;

    #[test]
    fn test_describe_recurrence() {
        assert_eq!(describe_recurrence(&Recurrence::None), "once");
        assert_eq!(
            describe_recurrence(&Recurrence::repeating(Frequency::Weekly, RecurrenceBound::Count(3))),
            "weekly, 3 times"
        );
        let until = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(
            describe_recurrence(&Recurrence::repeating(Frequency::Monthly, RecurrenceBound::Until(until))),
            "monthly until 2024-12-31 23:00"
        );
    }
}
