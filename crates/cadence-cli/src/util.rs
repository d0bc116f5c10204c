use anyhow::Result;
use cadence_core::auth::Actor;
use cadence_core::error::CoreError;
use cadence_core::models::ListScope;
use cadence_core::repository::Repository;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IdError {
    #[error("ID prefix must be at least 2 characters long.")]
    TooShort,
    #[error("Ambiguous ID prefix '{prefix}'")]
    Ambiguous {
        prefix: String,
        candidates: Vec<(String, String)>,
    },
}

/// Accepts a full series UUID or a unique prefix of one the actor can see.
pub async fn resolve_series_id(repo: &impl Repository, actor: &Actor, input: &str) -> Result<Uuid> {
    if let Ok(id) = input.parse::<Uuid>() {
        return Ok(id);
    }

    let prefix = input.trim().to_lowercase();
    if prefix.len() < 2 {
        return Err(IdError::TooShort.into());
    }

    let matches: Vec<_> = repo
        .list_series(actor, ListScope::Visible)
        .await?
        .into_iter()
        .filter(|series| series.id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.id),
        [] => Err(CoreError::NotFound(format!("No series found with ID prefix '{}'", input)).into()),
        many => Err(IdError::Ambiguous {
            prefix: input.to_string(),
            candidates: many
                .iter()
                .map(|series| (series.id.to_string(), series.title.clone()))
                .collect(),
        }
        .into()),
    }
}

/// Same as [`resolve_series_id`], but among the overrides of one series.
pub async fn resolve_override_id(
    repo: &impl Repository,
    actor: &Actor,
    series_id: Uuid,
    input: &str,
) -> Result<Uuid> {
    if let Ok(id) = input.parse::<Uuid>() {
        return Ok(id);
    }

    let prefix = input.trim().to_lowercase();
    if prefix.len() < 2 {
        return Err(IdError::TooShort.into());
    }

    let matches: Vec<_> = repo
        .find_overrides(actor, series_id)
        .await?
        .into_iter()
        .filter(|record| record.id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.id),
        [] => Err(CoreError::NotFound(format!("No override found with ID prefix '{}'", input)).into()),
        many => Err(IdError::Ambiguous {
            prefix: input.to_string(),
            candidates: many
                .iter()
                .map(|record| (record.id.to_string(), record.title.clone()))
                .collect(),
        }
        .into()),
    }
}

pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}
