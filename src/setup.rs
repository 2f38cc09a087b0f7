use serde::Serialize;
use tokio_postgres::NoTls;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{DataError, Error};
use crate::response::ProxyResponse;

pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");
pub const DATA_SQL: &str = include_str!("../sql/data.sql");

pub const LOADED: &str = "Database schema initialized and data loaded";
pub const FAILED: &str = "Error on database schema initialization or data loading";

#[derive(Serialize)]
struct SetupMessage<'a> {
    message: &'a str,
}

pub async fn load(database: &DatabaseConfig) -> Result<(), Error> {
    let (client, connection) = database
        .pg_config()?
        .connect(NoTls)
        .await
        .map_err(DataError::Connect)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!("database connection error: {}", e);
        }
    });

    client
        .batch_execute(SCHEMA_SQL)
        .await
        .map_err(DataError::Query)?;
    client.batch_execute(DATA_SQL).await.map_err(DataError::Query)?;
    Ok(())
}

/// Always answers 200; the body says whether loading worked.
pub async fn handle(database: &DatabaseConfig) -> ProxyResponse {
    info!("setup started");

    let message = match load(database).await {
        Ok(()) => LOADED,
        Err(e) => {
            error!("setup failed: {}", e);
            FAILED
        }
    };

    info!("setup finished");
    let body = serde_json::to_string(&SetupMessage { message })
        .unwrap_or_else(|_| format!("{{\"message\":\"{}\"}}", message));
    ProxyResponse::json(200, body)
}
