use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::model::RecordTable;
use crate::strategy::PrimingStrategy;

/// Value of `AWS_LAMBDA_INITIALIZATION_TYPE` when the environment is being
/// initialized for a snapshot.
pub const SNAP_START: &str = "snap-start";

const DEFAULT_WARMUP_FILE: &str = "warmup-units.txt";

/// Connection settings for the relational store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// Builds a `tokio_postgres` config. Accepts `postgres://`,
    /// `postgresql://` and JDBC-style `jdbc:postgresql://` URLs.
    pub fn pg_config(&self) -> Result<tokio_postgres::Config, Error> {
        let url = self.url.strip_prefix("jdbc:").unwrap_or(&self.url);
        let mut config =
            tokio_postgres::Config::from_str(url).map_err(|e| Error::InvalidEnv {
                key: "DATABASE_URL",
                value: self.url.clone(),
                reason: e.to_string(),
            })?;

        if let Some(username) = &self.username {
            config.user(username.as_str());
        }
        if let Some(password) = &self.password {
            config.password(password.as_str());
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub strategy: PrimingStrategy,
    pub table: RecordTable,
    pub warmup_file: PathBuf,
    pub workers: usize,
    pub initialization_type: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let url = lookup("DATABASE_URL").ok_or(Error::MissingEnv("DATABASE_URL"))?;

        let strategy = match lookup("PRIMING_STRATEGY") {
            Some(raw) => raw.parse()?,
            None => PrimingStrategy::default(),
        };
        let table = match lookup("RECORD_TABLE") {
            Some(raw) => raw.parse()?,
            None => RecordTable::default(),
        };

        let warmup_file = match lookup("PRIMING_WARMUP_FILE") {
            Some(path) => PathBuf::from(path),
            None => match lookup("LAMBDA_TASK_ROOT") {
                Some(root) => PathBuf::from(root).join(DEFAULT_WARMUP_FILE),
                None => PathBuf::from(DEFAULT_WARMUP_FILE),
            },
        };

        let workers = worker_count(lookup("PRIMING_WORKERS").as_deref());

        Ok(Self {
            database: DatabaseConfig {
                url,
                username: lookup("DATABASE_USERNAME"),
                password: lookup("DATABASE_PASSWORD"),
            },
            strategy,
            table,
            warmup_file,
            workers,
            initialization_type: lookup("AWS_LAMBDA_INITIALIZATION_TYPE"),
        })
    }

    /// Whether this environment will be snapshotted after initialization.
    pub fn snapshot_enabled(&self) -> bool {
        self.initialization_type.as_deref() == Some(SNAP_START)
    }
}

// Warm-up worker count from the raw setting or detected CPUs, clamped to 1-6
pub fn worker_count(raw: Option<&str>) -> usize {
    if let Some(count) = raw.and_then(|s| s.trim().parse::<usize>().ok()) {
        return count.clamp(1, 6);
    }
    num_cpus::get().clamp(1, 6)
}
