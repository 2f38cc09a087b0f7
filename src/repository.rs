use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info, warn};

use crate::error::DataError;
use crate::model::{Record, RecordTable};

/// Reads every row of a table. Implementations report failures as-is.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_all(&self, table: RecordTable) -> Result<Vec<Record>, DataError>;

    // Drop any cached connection; the next fetch opens a fresh one.
    async fn reset(&self) {}
}

// Connects lazily, so an unreachable database at init never blocks startup
pub struct PostgresSource {
    config: tokio_postgres::Config,
    client: Mutex<Option<Client>>,
}

impl PostgresSource {
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Client, DataError> {
        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(DataError::Connect)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("database connection error: {}", e);
            }
        });

        info!("connected to database");
        Ok(client)
    }
}

#[async_trait]
impl RecordSource for PostgresSource {
    async fn fetch_all(&self, table: RecordTable) -> Result<Vec<Record>, DataError> {
        let mut guard = self.client.lock().await;

        if guard.as_ref().map_or(true, Client::is_closed) {
            *guard = Some(self.connect().await?);
        }
        let client = guard
            .as_ref()
            .ok_or_else(|| DataError::Unavailable("no database client".to_string()))?;

        let messages = client
            .simple_query(table.select_all())
            .await
            .map_err(DataError::Query)?;

        let mut records = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                records.push(Record::from_text(
                    row.try_get("id").map_err(DataError::Query)?,
                    row.try_get("name").map_err(DataError::Query)?,
                    row.try_get("type").map_err(DataError::Query)?,
                )?);
            }
        }

        debug!(table = %table, rows = records.len(), "query finished");
        Ok(records)
    }

    async fn reset(&self) {
        if self.client.lock().await.take().is_some() {
            info!("dropped cached database connection");
        }
    }
}

// Query boundary: failures below here are logged and read as an empty list
pub struct RecordService<S> {
    source: S,
    table: RecordTable,
}

impl<S: RecordSource> RecordService<S> {
    pub fn new(source: S, table: RecordTable) -> Self {
        Self { source, table }
    }

    pub fn table(&self) -> RecordTable {
        self.table
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn read(&self) -> Vec<Record> {
        info!(table = %self.table, "find_all started");

        let records = match self.source.fetch_all(self.table).await {
            Ok(records) => records,
            Err(e) => {
                error!(table = %self.table, "find_all error: {}", e);
                Vec::new()
            }
        };

        info!(table = %self.table, rows = records.len(), "find_all finished");
        records
    }

    pub async fn reset(&self) {
        self.source.reset().await;
    }
}
