//! Mutation coordinator.
//!
//! Every occurrence mutation runs in one transaction that
//! 1. reloads the series and checks rights, rule and anchor,
//! 2. writes the exclusion set with a compare-and-swap on `revision`,
//! 3. upserts or updates the override row, then commits.
//!
//! A lost revision race (or a busy database) rolls the attempt back and starts
//! over from a fresh read, up to `EngineConfig::max_mutation_attempts` times.
//! Nothing is visible to readers until the commit, so an anchor can never be
//! excluded without its override being written alongside it.

use crate::auth::Actor;
use crate::error::CoreError;
use crate::exclusions::ExclusionSet;
use crate::models::{truncate_to_millis, OccurrenceEdit, Override, OverrideFields, Series};
use crate::recurrence::RecurrenceEvaluator;
use crate::repository::rows::{to_millis, OverrideRow};
use crate::repository::SqliteRepository;
use crate::validation::validate_occurrence_edit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

/// Outcome of a single transactional attempt.
enum Attempt<T> {
    Done(T),
    Contended,
}

/// SQLITE_BUSY and its extended codes.
fn is_busy(error: &CoreError) -> bool {
    match error {
        CoreError::Database(sqlx::Error::Database(db)) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| code & 0xff == 5),
        _ => false,
    }
}

#[async_trait]
impl super::MutationCoordinator for SqliteRepository {
    async fn exclude_occurrence(&self, actor: &Actor, series_id: Uuid, anchor: DateTime<Utc>) -> Result<bool, CoreError> {
        let anchor = truncate_to_millis(anchor);
        let attempts = self.config().max_mutation_attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_exclude(actor, series_id, anchor).await {
                Ok(Attempt::Done(excluded)) => {
                    if excluded {
                        tracing::info!(%series_id, %anchor, "occurrence excluded");
                    }
                    return Ok(excluded);
                }
                Ok(Attempt::Contended) => {}
                Err(e) if is_busy(&e) => {}
                Err(e) => return Err(e),
            }
            tracing::debug!(%series_id, attempt, "exclude lost a concurrent write, retrying");
        }
        Err(exhausted(series_id, attempts))
    }

    async fn edit_occurrence(
        &self,
        actor: &Actor,
        series_id: Uuid,
        anchor: DateTime<Utc>,
        edit: OccurrenceEdit,
    ) -> Result<Override, CoreError> {
        let anchor = truncate_to_millis(anchor);
        let attempts = self.config().max_mutation_attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_edit_occurrence(actor, series_id, anchor, edit.clone()).await {
                Ok(Attempt::Done(record)) => {
                    tracing::info!(%series_id, %anchor, override_id = %record.id, "occurrence edited");
                    return Ok(record);
                }
                Ok(Attempt::Contended) => {}
                Err(e) if is_busy(&e) => {}
                Err(e) => return Err(e),
            }
            tracing::debug!(%series_id, attempt, "occurrence edit lost a concurrent write, retrying");
        }
        Err(exhausted(series_id, attempts))
    }

    async fn edit_override(
        &self,
        actor: &Actor,
        series_id: Uuid,
        override_id: Uuid,
        edit: OccurrenceEdit,
    ) -> Result<Override, CoreError> {
        let attempts = self.config().max_mutation_attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_edit_override(actor, series_id, override_id, edit.clone()).await {
                Ok(Attempt::Done(record)) => {
                    tracing::info!(%series_id, %override_id, "override edited");
                    return Ok(record);
                }
                Ok(Attempt::Contended) => {}
                Err(e) if is_busy(&e) => {}
                Err(e) => return Err(e),
            }
            tracing::debug!(%series_id, attempt, "override edit lost a concurrent write, retrying");
        }
        Err(exhausted(series_id, attempts))
    }
}

fn exhausted(series_id: Uuid, attempts: u32) -> CoreError {
    CoreError::Conflict(format!(
        "series {} kept changing; gave up after {} attempts",
        series_id, attempts
    ))
}

impl SqliteRepository {
    async fn try_exclude(
        &self,
        actor: &Actor,
        series_id: Uuid,
        anchor: DateTime<Utc>,
    ) -> Result<Attempt<bool>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let series = self.load_occurrence_target(&mut tx, actor, series_id).await?;
        self.ensure_anchor(&series, anchor)?;

        let mut exclusions = series.exclusions.clone();
        if !exclusions.insert(anchor) {
            // already excluded; dropping the transaction rolls it back
            return Ok(Attempt::Done(false));
        }
        if !Self::swap_exclusions_in_transaction(&mut tx, &series, &exclusions).await? {
            return Ok(Attempt::Contended);
        }

        tx.commit().await?;
        Ok(Attempt::Done(true))
    }

    async fn try_edit_occurrence(
        &self,
        actor: &Actor,
        series_id: Uuid,
        anchor: DateTime<Utc>,
        edit: OccurrenceEdit,
    ) -> Result<Attempt<Override>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let series = self.load_occurrence_target(&mut tx, actor, series_id).await?;
        self.ensure_anchor(&series, anchor)?;

        let existing = Self::find_override_at_in_transaction(&mut tx, series.id, anchor).await?;
        let current = match &existing {
            Some(record) => record.fields(),
            None => series.occurrence_fields(anchor),
        };
        let fields = validate_occurrence_edit(&current, edit)?;

        let mut exclusions = series.exclusions.clone();
        exclusions.insert(anchor);
        if !Self::swap_exclusions_in_transaction(&mut tx, &series, &exclusions).await? {
            return Ok(Attempt::Contended);
        }
        let record = Self::upsert_override_in_transaction(&mut tx, &series, anchor, &fields).await?;

        tx.commit().await?;
        Ok(Attempt::Done(record))
    }

    async fn try_edit_override(
        &self,
        actor: &Actor,
        series_id: Uuid,
        override_id: Uuid,
        edit: OccurrenceEdit,
    ) -> Result<Attempt<Override>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let series = self.load_occurrence_target(&mut tx, actor, series_id).await?;

        let row: Option<OverrideRow> =
            sqlx::query_as("SELECT * FROM occurrence_overrides WHERE id = $1 AND series_id = $2")
                .bind(override_id)
                .bind(series.id)
                .fetch_optional(&mut *tx)
                .await?;
        let existing = row.map(Override::try_from).transpose()?.ok_or_else(|| {
            CoreError::NotFound(format!("Override {} not found for series {}", override_id, series.id))
        })?;
        let fields = validate_occurrence_edit(&existing.fields(), edit)?;

        // the anchor is normally excluded already; writing it again keeps the
        // pair consistent and bumps the revision either way
        let mut exclusions = series.exclusions.clone();
        exclusions.insert(existing.anchor);
        if !Self::swap_exclusions_in_transaction(&mut tx, &series, &exclusions).await? {
            return Ok(Attempt::Contended);
        }

        let row: OverrideRow = sqlx::query_as(
            r#"UPDATE occurrence_overrides
            SET title = $1, description = $2, start_ms = $3, end_ms = $4, updated_at = $5
            WHERE id = $6
            RETURNING *"#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(to_millis(fields.start))
        .bind(to_millis(fields.end))
        .bind(Utc::now())
        .bind(existing.id)
        .fetch_one(&mut *tx)
        .await?;
        let record = Override::try_from(row)?;

        tx.commit().await?;
        Ok(Attempt::Done(record))
    }

    /// Loads the series inside `tx` and checks it can take an occurrence
    /// mutation from `actor`.
    async fn load_occurrence_target(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        actor: &Actor,
        series_id: Uuid,
    ) -> Result<Series, CoreError> {
        let series = Self::find_series_in_transaction(tx, series_id)
            .await?
            .ok_or_else(|| CoreError::series_not_found(series_id))?;
        self.ensure_can_manage(actor, &series)?;
        if !series.is_recurring() {
            return Err(CoreError::NotRecurring(series.id));
        }
        Ok(series)
    }

    /// The anchor must be one the rule actually produces, at ms precision.
    fn ensure_anchor(&self, series: &Series, anchor: DateTime<Utc>) -> Result<(), CoreError> {
        let evaluator = RecurrenceEvaluator::new(self.config().iteration_ceiling);
        if evaluator.is_anchor_of(series, anchor) {
            Ok(())
        } else {
            Err(CoreError::invalid(format!(
                "{} is not an occurrence of series {}.",
                anchor.to_rfc3339(),
                series.id
            )))
        }
    }

    /// Writes the exclusion payload if nobody else wrote the series since it
    /// was read. Returns `false` when the revision moved.
    async fn swap_exclusions_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        series: &Series,
        exclusions: &ExclusionSet,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"UPDATE series
            SET excluded_dates = $1, revision = revision + 1, updated_at = $2
            WHERE id = $3 AND revision = $4"#,
        )
        .bind(exclusions.encode())
        .bind(Utc::now())
        .bind(series.id)
        .bind(series.revision)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_override_at_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        series_id: Uuid,
        anchor: DateTime<Utc>,
    ) -> Result<Option<Override>, CoreError> {
        let row: Option<OverrideRow> =
            sqlx::query_as("SELECT * FROM occurrence_overrides WHERE series_id = $1 AND anchor_ms = $2")
                .bind(series_id)
                .bind(to_millis(anchor))
                .fetch_optional(&mut **tx)
                .await?;
        row.map(Override::try_from).transpose()
    }

    /// One override per `(series, anchor)`: a second edit rewrites the fields
    /// of the existing row and keeps its id.
    async fn upsert_override_in_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        series: &Series,
        anchor: DateTime<Utc>,
        fields: &OverrideFields,
    ) -> Result<Override, CoreError> {
        let now = Utc::now();
        let row: OverrideRow = sqlx::query_as(
            r#"INSERT INTO occurrence_overrides
                (id, series_id, anchor_ms, title, description, start_ms, end_ms, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (series_id, anchor_ms) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                start_ms = excluded.start_ms,
                end_ms = excluded.end_ms,
                updated_at = excluded.updated_at
            RETURNING *"#,
        )
        .bind(Uuid::now_v7())
        .bind(series.id)
        .bind(to_millis(anchor))
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(to_millis(fields.start))
        .bind(to_millis(fields.end))
        .bind(series.owner_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Override::try_from(row)
    }
}
