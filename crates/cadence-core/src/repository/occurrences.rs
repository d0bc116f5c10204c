use crate::auth::Actor;
use crate::error::CoreError;
use crate::models::{Occurrence, Override, Series, TimeWindow};
use crate::overrides::OverrideIndex;
use crate::repository::rows::{into_overrides, into_series, to_millis, OverrideRow, SeriesRow};
use crate::repository::{SeriesRepository, SqliteRepository};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

/// Candidate series for a window: `$1` is the window end, `$2` the window
/// start (both epoch ms).
///
/// A single event qualifies when its own interval overlaps. A recurring series
/// qualifies when it starts before the window closes and its end-date bound,
/// stretched by one duration, reaches the window. A series also qualifies when
/// one of its overrides was moved into the window.
const CANDIDATE_SERIES_SQL: &str = r#"
SELECT * FROM series
WHERE (
        start_ms <= $1
        AND (
            (recurrence = 'NONE' AND end_ms >= $2)
            OR (
                recurrence <> 'NONE'
                AND (recurrence_ends_ms IS NULL OR recurrence_ends_ms + (end_ms - start_ms) >= $2)
            )
        )
    )
    OR id IN (SELECT series_id FROM occurrence_overrides WHERE start_ms <= $1 AND end_ms >= $2)
ORDER BY start_ms ASC, id ASC
"#;

#[async_trait]
impl super::OccurrenceRepository for SqliteRepository {
    async fn find_occurrences(&self, actor: &Actor, window: TimeWindow) -> Result<Vec<Occurrence>, CoreError> {
        let rows: Vec<SeriesRow> = sqlx::query_as(CANDIDATE_SERIES_SQL)
            .bind(to_millis(window.end))
            .bind(to_millis(window.start))
            .fetch_all(self.pool())
            .await?;

        let candidates: Vec<Series> = into_series(rows)?
            .into_iter()
            .filter(|series| self.policy().can_view(actor, series.owner_id))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|series| series.id).collect();
        let index: OverrideIndex = self.find_overrides_for(&ids).await?.into_iter().collect();

        let occurrences = self.compositor().compose(&candidates, &index, window);
        tracing::debug!(
            series = candidates.len(),
            overrides = index.len(),
            occurrences = occurrences.len(),
            "occurrences composed"
        );
        Ok(occurrences)
    }

    async fn find_overrides(&self, actor: &Actor, series_id: Uuid) -> Result<Vec<Override>, CoreError> {
        let series = self.get_series(actor, series_id).await?;
        self.find_overrides_for(&[series.id]).await
    }
}

impl SqliteRepository {
    /// Overrides of the given series, ordered by series then anchor.
    pub(crate) async fn find_overrides_for(&self, series_ids: &[Uuid]) -> Result<Vec<Override>, CoreError> {
        if series_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM occurrence_overrides WHERE series_id IN (");
        let mut separated = qb.separated(", ");
        for id in series_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY series_id ASC, anchor_ms ASC");

        let rows: Vec<OverrideRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        into_overrides(rows)
    }
}
