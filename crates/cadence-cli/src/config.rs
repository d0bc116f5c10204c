use cadence_core::auth::{Actor, Role};
use cadence_core::models::EngineConfig;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use uuid::Uuid;

pub const CONFIG_FILE: &str = "cadence.toml";
pub const ENV_PREFIX: &str = "CADENCE_";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Filter directive for the log subscriber; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Who the CLI acts as. Identity is supplied, not authenticated.
    #[serde(default)]
    pub actor_id: Uuid,
    #[serde(default)]
    pub actor_role: Role,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_database_path() -> String {
    "cadence.db".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// `cadence.toml` in the working directory, then `CADENCE_*` variables.
    /// Nested keys use a double underscore: `CADENCE_ENGINE__ITERATION_CEILING`.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id, self.actor_role)
    }
}
