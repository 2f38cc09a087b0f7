use thiserror::Error;

/// Failures raised while bootstrapping or running a priming environment.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown priming strategy {0:?}")]
    UnknownStrategy(String),

    #[error("unknown record table {0:?}")]
    UnknownTable(String),

    #[error("hook {hook} failed: {reason}")]
    Hook { hook: &'static str, reason: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Failures at the data-access boundary. These never reach a caller of
/// `RecordService::read`; they are logged and turned into an empty list.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] tokio_postgres::Error),

    #[error("query failed: {0}")]
    Query(#[source] tokio_postgres::Error),

    #[error("column {0} missing or null")]
    MissingColumn(&'static str),

    #[error("invalid record id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("record source unavailable: {0}")]
    Unavailable(String),
}
