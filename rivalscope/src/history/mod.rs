//! Per-user query history: store contract, row decoding, and backends

mod memory;
mod rest;

pub use memory::{MemoryHistoryStore, DEFAULT_HISTORY_CAP};
pub use rest::RestHistoryStore;

use crate::auth::AuthError;
use crate::model::{CompetitorResult, HistoryEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Backend failures on save, list, or delete
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode history rows: {0}")]
    Decode(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Failed to access local history {}: {source}", path.display())]
    Local {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Any failure of a history operation
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HistoryError {
    pub fn is_auth(&self) -> bool {
        matches!(self, HistoryError::Auth(_))
    }
}

/// Trait for history backends
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert one record for the current user
    async fn save(
        &self,
        query: &str,
        results: &[CompetitorResult],
        recommendations: Option<&str>,
    ) -> Result<(), HistoryError>;

    /// All records of the current user, newest first
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Delete by identifier. Deleting an absent id succeeds.
    async fn remove(&self, id: &str) -> Result<(), HistoryError>;
}

/// Row as inserted into the store
#[derive(Debug, Serialize)]
pub(crate) struct NewHistoryRow<'a> {
    pub user_id: &'a str,
    pub query_text: &'a str,
    pub results: &'a [CompetitorResult],
    pub result_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_recommendations: Option<&'a str>,
}

impl<'a> NewHistoryRow<'a> {
    pub fn new(
        user_id: &'a str,
        query_text: &'a str,
        results: &'a [CompetitorResult],
        developer_recommendations: Option<&'a str>,
    ) -> Self {
        Self {
            user_id,
            query_text,
            results,
            result_count: results.len() as u64,
            developer_recommendations,
        }
    }
}

/// Row as read back; every column may be missing or null
#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    query_text: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    result_count: Option<u64>,
    #[serde(default)]
    results: Option<Value>,
    #[serde(default)]
    developer_recommendations: Option<String>,
}

impl HistoryRow {
    pub fn into_entry(self) -> HistoryEntry {
        let id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let results = decode_results(&id, self.results);
        let result_count = self.result_count.unwrap_or(0);

        if !results.is_empty() && result_count != results.len() as u64 {
            debug!(
                id = %id,
                result_count,
                stored = results.len(),
                "Stored result count disagrees with stored results"
            );
        }

        HistoryEntry {
            id,
            query_text: self.query_text.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            result_count,
            results,
            developer_recommendations: self.developer_recommendations,
        }
    }
}

/// Stored results may be a JSON array or a JSON-encoded string of one.
/// Each record decodes on its own; an undecodable record is skipped.
fn decode_results(id: &str, value: Option<Value>) -> Vec<CompetitorResult> {
    let value = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(id, error = %e, "Ignoring undecodable stored results");
                return Vec::new();
            }
        },
        Some(other) => other,
    };

    let records = match value {
        Value::Array(records) => records,
        other => {
            warn!(id, kind = value_kind(&other), "Stored results are not a list");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(id, index, error = %e, "Skipping undecodable stored result");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> HistoryRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_row_defaults() {
        let entry = row(json!({"id": "a1", "query_text": "Firebase"})).into_entry();
        assert_eq!(entry.id, "a1");
        assert_eq!(entry.created_at, "");
        assert_eq!(entry.result_count, 0);
        assert!(entry.results.is_empty());
        assert_eq!(entry.developer_recommendations, None);
    }

    #[test]
    fn test_row_nulls_and_numeric_id() {
        let entry = row(json!({
            "id": 42,
            "query_text": "Firebase",
            "created_at": null,
            "result_count": null,
            "results": null
        }))
        .into_entry();
        assert_eq!(entry.id, "42");
        assert_eq!(entry.created_at, "");
        assert_eq!(entry.result_count, 0);
    }

    #[test]
    fn test_row_results_as_array_or_string() {
        let results = json!([{"id": "supabase", "name": "Supabase", "description": "Postgres"}]);

        let entry = row(json!({"id": "1", "results": results.clone(), "result_count": 1})).into_entry();
        assert_eq!(entry.results.len(), 1);
        assert_eq!(entry.results[0].name, "Supabase");

        let entry = row(json!({"id": "2", "results": results.to_string(), "result_count": 1})).into_entry();
        assert_eq!(entry.results.len(), 1);
    }

    #[test]
    fn test_row_keeps_stored_count() {
        let entry = row(json!({"id": "1", "results": [], "result_count": 5})).into_entry();
        assert_eq!(entry.result_count, 5);
        assert!(entry.results.is_empty());
    }

    #[test]
    fn test_row_garbage_results_default_to_empty() {
        let entry = row(json!({"id": "1", "results": {"oops": true}})).into_entry();
        assert!(entry.results.is_empty());
    }

    #[test]
    fn test_row_partial_records_are_defaulted() {
        let entry = row(json!({
            "id": "1",
            "result_count": 2,
            "results": [
                {"id": "supabase", "name": "Supabase", "description": "Postgres"},
                {"id": "appwrite", "name": "Appwrite"}
            ]
        }))
        .into_entry();
        assert_eq!(entry.result_count, 2);
        assert_eq!(entry.results.len(), 2);
        assert_eq!(entry.results[1].name, "Appwrite");
        assert_eq!(entry.results[1].description, "");
    }

    #[test]
    fn test_row_bad_record_is_skipped_alone() {
        let entry = row(json!({
            "id": "1",
            "results": [
                {"id": "supabase", "name": "Supabase"},
                {"id": "broken", "name": 42},
                "not a record",
                {"name": "Nhost", "is_open_source": true}
            ]
        }))
        .into_entry();
        let names: Vec<_> = entry.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Supabase", "Nhost"]);
    }

    #[test]
    fn test_new_row_counts_results() {
        let results = vec![CompetitorResult::new("a", "A", ""), CompetitorResult::new("b", "B", "")];
        let row = NewHistoryRow::new("user-1", "Firebase", &results, None);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["result_count"], 2);
        assert_eq!(value["user_id"], "user-1");
        assert!(value.get("developer_recommendations").is_none());
    }
}
