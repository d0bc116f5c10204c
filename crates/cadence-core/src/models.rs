use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::exclusions::ExclusionSet;

/// Upper bound accepted for `RecurrenceBound::Count`.
pub const MAX_RECURRENCE_COUNT: u32 = 365;

/// Instants are compared at millisecond precision everywhere; anything finer
/// is dropped on the way in.
#[inline]
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// Persisted discriminant of a recurrence rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrenceKind::None => write!(f, "none"),
            RecurrenceKind::Daily => write!(f, "daily"),
            RecurrenceKind::Weekly => write!(f, "weekly"),
            RecurrenceKind::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence: {0} (expected none, daily, weekly or monthly)")]
pub struct ParseRecurrenceKindError(String);

impl FromStr for RecurrenceKind {
    type Err = ParseRecurrenceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "once" => Ok(RecurrenceKind::None),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            _ => Err(ParseRecurrenceKindError(s.to_string())),
        }
    }
}

/// Step size of a repeating rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl From<Frequency> for RecurrenceKind {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Daily => RecurrenceKind::Daily,
            Frequency::Weekly => RecurrenceKind::Weekly,
            Frequency::Monthly => RecurrenceKind::Monthly,
        }
    }
}

/// Stopping condition of a repeating rule. Exactly one of the two, by construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecurrenceBound {
    /// Total number of anchors the rule ever produces.
    Count(u32),
    /// Last instant an anchor may start at (inclusive).
    Until(DateTime<Utc>),
}

impl RecurrenceBound {
    pub fn count(count: u32) -> Result<Self, CoreError> {
        if !(1..=MAX_RECURRENCE_COUNT).contains(&count) {
            return Err(CoreError::invalid(format!(
                "recurrence count must be an integer between 1 and {}.",
                MAX_RECURRENCE_COUNT
            )));
        }
        Ok(RecurrenceBound::Count(count))
    }

    pub fn until(until: DateTime<Utc>) -> Self {
        RecurrenceBound::Until(truncate_to_millis(until))
    }
}

/// A series' repeat rule together with its bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Recurrence {
    #[default]
    None,
    Repeating {
        frequency: Frequency,
        bound: RecurrenceBound,
    },
}

impl Recurrence {
    pub fn repeating(frequency: Frequency, bound: RecurrenceBound) -> Self {
        Recurrence::Repeating { frequency, bound }
    }

    /// Rebuilds a rule from its flat persisted columns, rejecting any combination
    /// that violates the bound rule.
    pub fn from_parts(
        kind: RecurrenceKind,
        count: Option<i64>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Self, CoreError> {
        let frequency = match kind {
            RecurrenceKind::None => {
                if count.is_some() || until.is_some() {
                    return Err(CoreError::invalid(
                        "Non-recurring events cannot have a recurrence end date/time or count.",
                    ));
                }
                return Ok(Recurrence::None);
            }
            RecurrenceKind::Daily => Frequency::Daily,
            RecurrenceKind::Weekly => Frequency::Weekly,
            RecurrenceKind::Monthly => Frequency::Monthly,
        };

        let bound = match (count, until) {
            (Some(_), Some(_)) => {
                return Err(CoreError::invalid(
                    "Provide recurrence end date/time OR recurrence count, not both.",
                ))
            }
            (None, None) => {
                return Err(CoreError::invalid(
                    "Recurring events require either an end date/time or number of occurrences.",
                ))
            }
            (Some(count), None) => {
                let count = u32::try_from(count).map_err(|_| {
                    CoreError::invalid(format!(
                        "recurrence count must be an integer between 1 and {}.",
                        MAX_RECURRENCE_COUNT
                    ))
                })?;
                RecurrenceBound::count(count)?
            }
            (None, Some(until)) => RecurrenceBound::until(until),
        };

        Ok(Recurrence::Repeating { frequency, bound })
    }

    pub fn kind(&self) -> RecurrenceKind {
        match self {
            Recurrence::None => RecurrenceKind::None,
            Recurrence::Repeating { frequency, .. } => (*frequency).into(),
        }
    }

    pub fn frequency(&self) -> Option<Frequency> {
        match self {
            Recurrence::None => None,
            Recurrence::Repeating { frequency, .. } => Some(*frequency),
        }
    }

    pub fn bound(&self) -> Option<RecurrenceBound> {
        match self {
            Recurrence::None => None,
            Recurrence::Repeating { bound, .. } => Some(*bound),
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self.bound() {
            Some(RecurrenceBound::Count(count)) => Some(count),
            _ => None,
        }
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        match self.bound() {
            Some(RecurrenceBound::Until(until)) => Some(until),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::Repeating { .. })
    }
}

/// Root definition of a single or recurring event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Series {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recurrence: Recurrence,
    /// Anchors removed from base generation.
    pub exclusions: ExclusionSet,
    pub owner_id: Uuid,
    /// Bumped on every write; the mutation coordinator uses it to detect
    /// concurrent writers.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Series {
    /// Fixed length shared by all base-derived occurrences.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }

    /// Content the base rule renders at `anchor`.
    pub fn occurrence_fields(&self, anchor: DateTime<Utc>) -> OverrideFields {
        OverrideFields {
            title: self.title.clone(),
            description: self.description.clone(),
            start: anchor,
            end: anchor + self.duration(),
        }
    }
}

/// A materialized, independently edited occurrence keyed by its original anchor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Override {
    pub id: Uuid,
    pub series_id: Uuid,
    /// The unmodified occurrence start this record replaces.
    pub anchor: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Override {
    pub fn fields(&self) -> OverrideFields {
        OverrideFields {
            title: self.title.clone(),
            description: self.description.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Validated content written into an override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideFields {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Raw series fields as supplied by a caller, before validation.
#[derive(Debug, Clone)]
pub struct SeriesInput {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recurrence: RecurrenceKind,
    pub count: Option<i64>,
    pub until: Option<DateTime<Utc>>,
}

impl Default for SeriesInput {
    fn default() -> Self {
        let start = truncate_to_millis(Utc::now());
        Self {
            title: String::new(),
            description: None,
            start,
            end: start + Duration::hours(1),
            recurrence: RecurrenceKind::None,
            count: None,
            until: None,
        }
    }
}

/// Validated series fields, used for both creation and full replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFields {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recurrence: Recurrence,
}

/// Requested change to a single occurrence of a recurring series.
///
/// The new interval is always required. `title: None` keeps the current title;
/// `description: None` keeps the current description and `Some(None)` clears it.
#[derive(Debug, Clone)]
pub struct OccurrenceEdit {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl OccurrenceEdit {
    /// Moves the occurrence to `[start, end)` and keeps its content.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: None,
            description: None,
            start,
            end,
        }
    }
}

/// Inclusive query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::invalid("end must be after start."));
        }
        Ok(Self { start, end })
    }

    /// Inclusive overlap: `start_a <= end_b && end_a >= start_b`.
    #[inline]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }
}

/// One concrete, time-bounded entry of a query result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Occurrence {
    /// Id of the series this occurrence belongs to.
    pub logical_event_id: Uuid,
    /// Series id for base-derived entries, override id for overrides.
    pub source_id: Uuid,
    pub anchor: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub derived_from_base: bool,
    pub is_override: bool,
    pub owner_id: Uuid,
}

/// Which series a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Everything the actor may view.
    #[default]
    Visible,
    /// Only series the actor owns.
    Mine,
}

/// Tunables for the engine, separate from the CLI config so the core stays
/// free of file/env handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on evaluator steps per series. Zero is treated as one.
    pub iteration_ceiling: usize,
    /// How often an occurrence mutation is retried after losing a revision race.
    pub max_mutation_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iteration_ceiling: crate::recurrence::DEFAULT_ITERATION_CEILING,
            max_mutation_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recurrence_kind_round_trip() {
        for kind in [
            RecurrenceKind::None,
            RecurrenceKind::Daily,
            RecurrenceKind::Weekly,
            RecurrenceKind::Monthly,
        ] {
            assert_eq!(kind.to_string().parse::<RecurrenceKind>(), Ok(kind));
        }
        assert!("yearly".parse::<RecurrenceKind>().is_err());
        assert_eq!("WEEKLY".parse::<RecurrenceKind>(), Ok(RecurrenceKind::Weekly));
    }

    #[test]
    fn test_from_parts_requires_exactly_one_bound() {
        let until = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let both = Recurrence::from_parts(RecurrenceKind::Daily, Some(3), Some(until));
        assert!(matches!(both, Err(CoreError::InvalidInput(_))));

        let neither = Recurrence::from_parts(RecurrenceKind::Daily, None, None);
        assert!(matches!(neither, Err(CoreError::InvalidInput(_))));

        let count = Recurrence::from_parts(RecurrenceKind::Weekly, Some(3), None).unwrap();
        assert_eq!(count.count(), Some(3));
        assert_eq!(count.kind(), RecurrenceKind::Weekly);

        let dated = Recurrence::from_parts(RecurrenceKind::Monthly, None, Some(until)).unwrap();
        assert_eq!(dated.until(), Some(until));
    }

    #[test]
    fn test_from_parts_rejects_bound_on_single_event() {
        let result = Recurrence::from_parts(RecurrenceKind::None, Some(2), None);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert_eq!(
            Recurrence::from_parts(RecurrenceKind::None, None, None).unwrap(),
            Recurrence::None
        );
    }

    #[test]
    fn test_count_range() {
        assert!(RecurrenceBound::count(0).is_err());
        assert!(RecurrenceBound::count(1).is_ok());
        assert!(RecurrenceBound::count(365).is_ok());
        assert!(RecurrenceBound::count(366).is_err());
        assert!(Recurrence::from_parts(RecurrenceKind::Daily, Some(-4), None).is_err());
    }

    #[test]
    fn test_window_overlap_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let window = TimeWindow::new(start, end).unwrap();

        // touching either edge counts
        assert!(window.overlaps(end, end + Duration::hours(1)));
        assert!(window.overlaps(start - Duration::hours(1), start));
        assert!(!window.overlaps(end + Duration::milliseconds(1), end + Duration::hours(1)));
        assert!(TimeWindow::new(end, start).is_err());
    }

    #[test]
    fn test_truncate_to_millis() {
        let precise = Utc.timestamp_nanos(1_704_103_200_123_456_789);
        assert_eq!(truncate_to_millis(precise).timestamp_millis(), 1_704_103_200_123);
        assert_eq!(truncate_to_millis(precise).timestamp_subsec_nanos(), 123_000_000);
    }
}
