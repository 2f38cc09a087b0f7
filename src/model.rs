use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{DataError, Error};

/// A row of the `unicorn` or `priming` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

impl Record {
    pub fn new(id: Uuid, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
        }
    }

    /// Builds a record from the text columns `id`, `name` and `type`.
    pub fn from_text(
        id: Option<&str>,
        name: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, DataError> {
        let id = id.ok_or(DataError::MissingColumn("id"))?;
        let name = name.ok_or(DataError::MissingColumn("name"))?;
        let category = category.ok_or(DataError::MissingColumn("type"))?;

        Ok(Self::new(Uuid::parse_str(id.trim())?, name, category))
    }
}

/// The two flat tables a function can be deployed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordTable {
    #[default]
    Unicorn,
    Priming,
}

impl RecordTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTable::Unicorn => "unicorn",
            RecordTable::Priming => "priming",
        }
    }

    pub fn select_all(&self) -> &'static str {
        match self {
            RecordTable::Unicorn => "SELECT * FROM unicorn",
            RecordTable::Priming => "SELECT * FROM priming",
        }
    }
}

impl fmt::Display for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unicorn" => Ok(RecordTable::Unicorn),
            "priming" => Ok(RecordTable::Priming),
            _ => Err(Error::UnknownTable(s.to_string())),
        }
    }
}
