use crate::auth::Actor;
use crate::error::CoreError;
use crate::models::{ListScope, Series, SeriesFields, SeriesInput};
use crate::repository::rows::{into_series, to_millis, SeriesRow};
use crate::repository::SqliteRepository;
use crate::validation::validate_new_series;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::SeriesRepository for SqliteRepository {
    async fn create_series(&self, actor: &Actor, data: SeriesInput) -> Result<Series, CoreError> {
        let fields = validate_new_series(data)?;
        let now = Utc::now();

        let series = Series {
            id: Uuid::now_v7(),
            title: fields.title,
            description: fields.description,
            start: fields.start,
            end: fields.end,
            recurrence: fields.recurrence,
            exclusions: Default::default(),
            owner_id: actor.id,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO series (id, title, description, start_ms, end_ms, recurrence, recurrence_count,
                recurrence_ends_ms, excluded_dates, owner_id, revision, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(series.id)
        .bind(&series.title)
        .bind(&series.description)
        .bind(to_millis(series.start))
        .bind(to_millis(series.end))
        .bind(series.recurrence.kind())
        .bind(series.recurrence.count().map(i64::from))
        .bind(series.recurrence.until().map(to_millis))
        .bind(series.exclusions.encode())
        .bind(series.owner_id)
        .bind(series.revision)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(self.pool())
        .await?;

        tracing::info!(series_id = %series.id, recurrence = %series.recurrence.kind(), "series created");
        Ok(series)
    }

    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<Series>, CoreError> {
        let row: Option<SeriesRow> = sqlx::query_as("SELECT * FROM series WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(Series::try_from).transpose()
    }

    async fn get_series(&self, actor: &Actor, id: Uuid) -> Result<Series, CoreError> {
        let series = self
            .find_series_by_id(id)
            .await?
            .ok_or_else(|| CoreError::series_not_found(id))?;
        self.ensure_can_view(actor, &series)?;
        Ok(series)
    }

    async fn list_series(&self, actor: &Actor, scope: ListScope) -> Result<Vec<Series>, CoreError> {
        let rows: Vec<SeriesRow> = sqlx::query_as("SELECT * FROM series ORDER BY start_ms ASC, id ASC")
            .fetch_all(self.pool())
            .await?;

        let series = into_series(rows)?
            .into_iter()
            .filter(|series| match scope {
                ListScope::Visible => self.policy().can_view(actor, series.owner_id),
                ListScope::Mine => series.owner_id == actor.id,
            })
            .collect();
        Ok(series)
    }

    async fn update_series(&self, actor: &Actor, id: Uuid, data: SeriesInput) -> Result<Series, CoreError> {
        let fields = validate_new_series(data)?;
        let mut tx = self.pool().begin().await?;

        let current = Self::find_series_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::series_not_found(id))?;
        self.ensure_can_manage(actor, &current)?;

        let updated = Self::replace_series_fields_in_transaction(&mut tx, &current, fields).await?;
        tx.commit().await?;

        tracing::info!(series_id = %id, revision = updated.revision, "series updated");
        Ok(updated)
    }

    async fn delete_series(&self, actor: &Actor, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let series = Self::find_series_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::series_not_found(id))?;
        self.ensure_can_manage(actor, &series)?;

        let overrides = sqlx::query("DELETE FROM occurrence_overrides WHERE series_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM series WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(series_id = %id, overrides, "series deleted");
        Ok(())
    }
}

impl SqliteRepository {
    pub(crate) async fn find_series_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<Series>, CoreError> {
        let row: Option<SeriesRow> = sqlx::query_as("SELECT * FROM series WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        row.map(Series::try_from).transpose()
    }

    /// Full replacement of the editable fields. Exclusions and overrides are
    /// left as they are.
    async fn replace_series_fields_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        current: &Series,
        fields: SeriesFields,
    ) -> Result<Series, CoreError> {
        let updated = Series {
            title: fields.title,
            description: fields.description,
            start: fields.start,
            end: fields.end,
            recurrence: fields.recurrence,
            revision: current.revision + 1,
            updated_at: Utc::now(),
            ..current.clone()
        };

        let result = sqlx::query(
            r#"UPDATE series
            SET title = $1, description = $2, start_ms = $3, end_ms = $4, recurrence = $5,
                recurrence_count = $6, recurrence_ends_ms = $7, revision = $8, updated_at = $9
            WHERE id = $10 AND revision = $11"#,
        )
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(to_millis(updated.start))
        .bind(to_millis(updated.end))
        .bind(updated.recurrence.kind())
        .bind(updated.recurrence.count().map(i64::from))
        .bind(updated.recurrence.until().map(to_millis))
        .bind(updated.revision)
        .bind(updated.updated_at)
        .bind(updated.id)
        .bind(current.revision)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "series {} was modified concurrently",
                current.id
            )));
        }
        Ok(updated)
    }
}
