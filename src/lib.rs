//! Lambda priming strategies for snapshot-restored execution environments.

pub mod config;
pub mod environment;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod response;
pub mod setup;
pub mod strategy;
pub mod warmup;

pub use config::Config;
pub use environment::Environment;
pub use error::{DataError, Error};
pub use handler::{ManualPrimer, RecordHandler};
pub use lifecycle::{HookRegistry, Phase, SnapshotResource};
pub use model::{Record, RecordTable};
pub use repository::{PostgresSource, RecordService, RecordSource};
pub use response::{ProxyRequest, ProxyResponse};
pub use strategy::PrimingStrategy;
pub use warmup::{WarmupPlan, WarmupReport};

// CloudWatch adds the ingestion time, so no timestamps or targets
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();
}
