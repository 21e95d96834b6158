use super::error::{MissingConfigSnafu, Result};
use snafu::OptionExt;

pub const PROJECT_ID_KEY: &'static str = "GCP_PROJECT";
pub const FALLBACK_PROJECT_ID_KEY: &'static str = "GOOGLE_CLOUD_PROJECT";
pub const INSTANCE_NAME_KEY: &'static str = "CLOUD_SQL_INSTANCE_NAME";
pub const BUCKET_NAME_KEY: &'static str = "BUCKET_NAME";
pub const BACKUP_DIR_KEY: &'static str = "BACKUP_DIR";
pub const DATABASE_NAME_KEY: &'static str = "DATABASE_NAME";

/// Everything a single export needs to know about where to read from
/// and where to write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub project_id: String,
    pub instance: String,
    pub bucket: String,
    /// Path prefix inside `bucket`, without leading or trailing slashes
    pub backup_dir: String,
    /// `None` exports every database in the instance
    pub database: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, treating empty values
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).context(MissingConfigSnafu { key });

        let project_id = match get(PROJECT_ID_KEY) {
            Some(project_id) => project_id,
            None => get(FALLBACK_PROJECT_ID_KEY).context(MissingConfigSnafu {
                key: PROJECT_ID_KEY,
            })?,
        };
        let instance = require(INSTANCE_NAME_KEY)?;
        let bucket = require(BUCKET_NAME_KEY)?;
        let backup_dir = require(BACKUP_DIR_KEY)?.trim_matches('/').to_string();
        let database = get(DATABASE_NAME_KEY);

        Ok(Config {
            project_id,
            instance,
            bucket,
            backup_dir,
            database,
        })
    }

    /// Overrides the database filter; a blank override means "no filter".
    pub fn with_database<S: Into<String>>(mut self, database: Option<S>) -> Config {
        if let Some(database) = database {
            let database: String = database.into();
            self.database = Some(database).filter(|d| !d.trim().is_empty());
        }
        self
    }
}
