//! Input validation for series and occurrence writes.
//!
//! Everything here runs before any state change; failures carry a reason
//! suitable for showing to the user.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::{
    truncate_to_millis, OccurrenceEdit, OverrideFields, Recurrence, SeriesFields, SeriesInput,
    TimeWindow,
};

pub const MAX_TITLE_CHARS: usize = 150;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

fn normalize_title(raw: &str) -> Result<String, CoreError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CoreError::invalid("Title is required."));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::invalid(format!(
            "Title must be {} characters or less.",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

fn normalize_description(raw: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(CoreError::invalid(format!(
            "Description must be {} characters or less.",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(Some(description.to_string()))
}

fn ensure_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), CoreError> {
    if end <= start {
        return Err(CoreError::invalid("End date/time must be after start date/time."));
    }
    Ok(())
}

/// Validates the fields of a series being created or fully replaced.
///
/// # Behavior
/// - title is trimmed, required, at most 150 characters
/// - description is trimmed; blank becomes absent; at most 1000 characters
/// - `end` must be strictly after `start`
/// - a repeating rule needs exactly one of count (1..=365) or end date, and the
///   end date may not precede `start`; a single event takes neither
///
/// All instants are truncated to millisecond precision.
pub fn validate_new_series(input: SeriesInput) -> Result<SeriesFields, CoreError> {
    let title = normalize_title(&input.title)?;
    let description = normalize_description(input.description.as_deref())?;

    let start = truncate_to_millis(input.start);
    let end = truncate_to_millis(input.end);
    ensure_interval(start, end)?;

    let recurrence = Recurrence::from_parts(
        input.recurrence,
        input.count,
        input.until.map(truncate_to_millis),
    )?;
    if let Some(until) = recurrence.until() {
        if until < start {
            return Err(CoreError::invalid(
                "Recurrence end must not be before event start.",
            ));
        }
    }

    Ok(SeriesFields {
        title,
        description,
        start,
        end,
        recurrence,
    })
}

/// Resolves a single-occurrence edit against the values it replaces.
///
/// `current` is what the occurrence shows today: the series content at the
/// anchor, or an existing override. An absent title or description keeps the
/// current value; `description: Some(None)` clears the description. The
/// interval always comes from the edit.
pub fn validate_occurrence_edit(
    current: &OverrideFields,
    edit: OccurrenceEdit,
) -> Result<OverrideFields, CoreError> {
    let title = match edit.title.as_deref() {
        Some(raw) => normalize_title(raw)?,
        None => current.title.clone(),
    };
    let description = match edit.description {
        Some(raw) => normalize_description(raw.as_deref())?,
        None => current.description.clone(),
    };

    let start = truncate_to_millis(edit.start);
    let end = truncate_to_millis(edit.end);
    ensure_interval(start, end)?;

    Ok(OverrideFields {
        title,
        description,
        start,
        end,
    })
}

/// Builds a query window; `end` may equal `start` but not precede it.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeWindow, CoreError> {
    TimeWindow::new(truncate_to_millis(start), truncate_to_millis(end))
}
