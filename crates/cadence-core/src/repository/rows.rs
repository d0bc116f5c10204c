//! Row shapes as stored in SQLite and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::CoreError;
use crate::exclusions::ExclusionSet;
use crate::models::{Override, Recurrence, RecurrenceKind, Series};

#[inline]
pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

fn decode_error(column: &str, reason: String) -> CoreError {
    CoreError::Database(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: reason.into(),
    })
}

fn from_millis(column: &str, millis: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| decode_error(column, format!("{} is not a representable instant", millis)))
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SeriesRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_ms: i64,
    pub end_ms: i64,
    pub recurrence: RecurrenceKind,
    pub recurrence_count: Option<i64>,
    pub recurrence_ends_ms: Option<i64>,
    pub excluded_dates: Option<String>,
    pub owner_id: Uuid,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SeriesRow> for Series {
    type Error = CoreError;

    fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
        let until = row
            .recurrence_ends_ms
            .map(|ms| from_millis("recurrence_ends_ms", ms))
            .transpose()?;
        let recurrence = Recurrence::from_parts(row.recurrence, row.recurrence_count, until)
            .map_err(|e| decode_error("recurrence", e.to_string()))?;

        Ok(Series {
            id: row.id,
            title: row.title,
            description: row.description,
            start: from_millis("start_ms", row.start_ms)?,
            end: from_millis("end_ms", row.end_ms)?,
            recurrence,
            exclusions: ExclusionSet::decode(row.excluded_dates.as_deref()),
            owner_id: row.owner_id,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct OverrideRow {
    pub id: Uuid,
    pub series_id: Uuid,
    pub anchor_ms: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_ms: i64,
    pub end_ms: i64,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OverrideRow> for Override {
    type Error = CoreError;

    fn try_from(row: OverrideRow) -> Result<Self, Self::Error> {
        Ok(Override {
            id: row.id,
            series_id: row.series_id,
            anchor: from_millis("anchor_ms", row.anchor_ms)?,
            title: row.title,
            description: row.description,
            start: from_millis("start_ms", row.start_ms)?,
            end: from_millis("end_ms", row.end_ms)?,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_series(rows: Vec<SeriesRow>) -> Result<Vec<Series>, CoreError> {
    rows.into_iter().map(Series::try_from).collect()
}

pub(crate) fn into_overrides(rows: Vec<OverrideRow>) -> Result<Vec<Override>, CoreError> {
    rows.into_iter().map(Override::try_from).collect()
}
