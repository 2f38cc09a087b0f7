use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::model::Record;

/// HTTP-shaped trigger input. Accepts API Gateway proxy (v1) field names
/// and the `rawPath` of HTTP API (v2) events; every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    pub http_method: Option<String>,
    #[serde(alias = "rawPath")]
    pub path: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl ProxyRequest {
    pub fn get(path: &str) -> Self {
        Self {
            http_method: Some("GET".to_string()),
            path: Some(path.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    pub fn json(status_code: u16, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, json!({ "message": message }).to_string())
    }
}

/// Transfer representation of a [`Record`].
#[derive(Debug, Serialize)]
pub struct RecordDto<'a> {
    pub id: &'a Uuid,
    pub name: &'a str,
    pub category: &'a str,
}

impl<'a> From<&'a Record> for RecordDto<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            category: &record.category,
        }
    }
}

/// Serializes records into a 200 response, or a 500 carrying an error
/// message if serialization fails.
pub fn records_response(records: &[Record]) -> ProxyResponse {
    let dtos: Vec<RecordDto<'_>> = records.iter().map(RecordDto::from).collect();
    match serde_json::to_string(&dtos) {
        Ok(body) => ProxyResponse::json(200, body),
        Err(e) => ProxyResponse::error(500, &e.to_string()),
    }
}
