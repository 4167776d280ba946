//! Remote analysis gateway: request contract, response validation, and
//! mapping of raw company records into [`CompetitorResult`]s.
//!
//! The gateway returns loosely-shaped JSON. Everything crossing this module's
//! boundary has been checked against the wire schema; a payload that does not
//! conform fails the whole call with [`GatewayError::UnexpectedFormat`].

mod http;
pub mod sample;

pub use http::HttpGateway;

use crate::model::{AnalysisResponse, CompetitorResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Path of the analysis endpoint, relative to the configured base URL
pub const RESEARCH_PATH: &str = "/run-research";

/// Errors that can occur when talking to the analysis gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `message` comes from the error body when it had one
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("unexpected response format")]
    UnexpectedFormat,

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Request body sent to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
}

/// Structured error body the gateway may attach to a non-success status
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

/// Trait for analysis gateways
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Run one analysis. All-or-nothing: no partial results on failure.
    async fn analyze(&self, query: &str) -> Result<AnalysisResponse, GatewayError>;
}

/// `api_available` arrives either as a note or as a bare flag
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ApiAvailability {
    Note(String),
    Flag(bool),
}

impl From<ApiAvailability> for String {
    fn from(value: ApiAvailability) -> Self {
        match value {
            ApiAvailability::Note(note) => note,
            ApiAvailability::Flag(true) => "Yes".to_string(),
            ApiAvailability::Flag(false) => "No".to_string(),
        }
    }
}

/// One company record as the gateway sends it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCompany {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    pricing_model: Option<String>,
    #[serde(default)]
    is_open_source: Option<bool>,
    #[serde(default)]
    tech_stack: Option<Vec<String>>,
    #[serde(default)]
    language_support: Option<Vec<String>>,
    #[serde(default)]
    api_available: Option<ApiAvailability>,
    #[serde(default)]
    integration_capabilities: Option<Vec<String>>,
    #[serde(default)]
    reason: Option<String>,
}

impl RawCompany {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Validate a success body and map it into an [`AnalysisResponse`]
pub fn parse_response(body: &str) -> Result<AnalysisResponse, GatewayError> {
    let value: Value = serde_json::from_str(body).map_err(|_| GatewayError::UnexpectedFormat)?;

    let companies = value
        .get("companies")
        .and_then(Value::as_array)
        .ok_or(GatewayError::UnexpectedFormat)?;
    let recommendations = value
        .get("developer_recommendations")
        .and_then(Value::as_str)
        .ok_or(GatewayError::UnexpectedFormat)?;

    let raw = companies
        .iter()
        .map(|record| {
            if !record.is_object() {
                return Err(GatewayError::UnexpectedFormat);
            }
            serde_json::from_value::<RawCompany>(record.clone())
                .map_err(|_| GatewayError::UnexpectedFormat)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnalysisResponse {
        competitors: map_companies(raw),
        developer_recommendations: recommendations.to_string(),
    })
}

/// Extract the user-facing message for a non-success status
pub(crate) fn status_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.message.trim().is_empty() => err.message,
        _ => format!("Request failed with status {}", status),
    }
}

/// Map raw records into canonical results, one per record, in order.
///
/// Identifiers are unique within the returned list. `is_best` is always
/// false here; the gateway has no say in it.
pub fn map_companies(raw: Vec<RawCompany>) -> Vec<CompetitorResult> {
    let mut ids = IdAllocator::default();

    raw.into_iter()
        .map(|company| {
            let name = company.name.unwrap_or_default();
            let id = ids.allocate(&name);

            CompetitorResult {
                id,
                name,
                description: company.description.unwrap_or_default(),
                website: company.website.unwrap_or_default(),
                pricing_model: company.pricing_model,
                is_open_source: company.is_open_source,
                tech_stack: company.tech_stack,
                language_support: company.language_support,
                api_available: company.api_available.map(String::from),
                integration_capabilities: company.integration_capabilities,
                is_best: false,
                reason: company.reason,
            }
        })
        .collect()
}

/// Lower-case the name and join its words with `-`
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn fallback_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Hands out identifiers that never repeat within one mapping call
#[derive(Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    fn allocate(&mut self, name: &str) -> String {
        let base = match slugify(name) {
            slug if slug.is_empty() => fallback_id(),
            slug => slug,
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Firebase"), "firebase");
        assert_eq!(slugify("  AWS   Amplify "), "aws-amplify");
        assert_eq!(slugify("Supabase\tCloud"), "supabase-cloud");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_map_preserves_length_and_order() {
        let raw = vec![
            RawCompany::named("Supabase"),
            RawCompany::named("Appwrite"),
            RawCompany::named("Nhost"),
        ];
        let mapped = map_companies(raw);
        assert_eq!(mapped.len(), 3);
        let names: Vec<_> = mapped.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Supabase", "Appwrite", "Nhost"]);
        assert!(mapped.iter().all(|c| !c.is_best));
    }

    #[test]
    fn test_duplicate_names_get_unique_ids() {
        let raw = vec![
            RawCompany::named("Back4App"),
            RawCompany::named("back4app"),
            RawCompany::named("Back4App"),
        ];
        let ids: Vec<_> = map_companies(raw).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["back4app", "back4app-2", "back4app-3"]);
    }

    #[test]
    fn test_nameless_records_get_fallback_ids() {
        let raw = vec![RawCompany::default(), RawCompany::default(), RawCompany::named("  ")];
        let mapped = map_companies(raw);
        let ids: HashSet<_> = mapped.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(mapped.iter().all(|c| !c.id.is_empty()));
        assert!(mapped.iter().all(|c| c.name.is_empty()));
    }

    #[test]
    fn test_parse_full_record() {
        let body = json!({
            "companies": [{
                "name": "Supabase",
                "description": "Postgres development platform",
                "website": "https://supabase.com",
                "pricing_model": "Freemium",
                "is_open_source": true,
                "tech_stack": ["PostgreSQL", "Elixir"],
                "language_support": ["JavaScript", "Dart"],
                "api_available": true,
                "integration_capabilities": ["Vercel"]
            }],
            "developer_recommendations": "Pick Supabase if you want SQL."
        })
        .to_string();

        let response = parse_response(&body).unwrap();
        assert_eq!(response.developer_recommendations, "Pick Supabase if you want SQL.");
        let c = &response.competitors[0];
        assert_eq!(c.id, "supabase");
        assert_eq!(c.pricing_model.as_deref(), Some("Freemium"));
        assert_eq!(c.is_open_source, Some(true));
        assert_eq!(c.tech_stack.as_deref(), Some(&["PostgreSQL".to_string(), "Elixir".to_string()][..]));
        assert_eq!(c.api_available.as_deref(), Some("Yes"));
        assert!(!c.is_best);
    }

    #[test]
    fn test_parse_defaults_missing_fields() {
        let body = r#"{"companies":[{"name":"Nhost"}],"developer_recommendations":""}"#;
        let response = parse_response(body).unwrap();
        let c = &response.competitors[0];
        assert_eq!(c.description, "");
        assert_eq!(c.website, "");
        assert_eq!(c.pricing_model, None);
        assert_eq!(c.is_open_source, None);
        assert_eq!(c.tech_stack, None);
        assert_eq!(c.reason, None);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        let cases = [
            "not json",
            r#"{"developer_recommendations":"x"}"#,
            r#"{"companies":{},"developer_recommendations":"x"}"#,
            r#"{"companies":[]}"#,
            r#"{"companies":[],"developer_recommendations":42}"#,
            r#"{"companies":["Supabase"],"developer_recommendations":"x"}"#,
            r#"{"companies":[{"name":7}],"developer_recommendations":"x"}"#,
        ];
        for body in cases {
            assert!(
                matches!(parse_response(body), Err(GatewayError::UnexpectedFormat)),
                "accepted: {}",
                body
            );
        }
    }

    #[test]
    fn test_status_message() {
        assert_eq!(status_message(500, r#"{"message":"upstream timeout"}"#), "upstream timeout");
        assert_eq!(status_message(502, "<html>bad gateway</html>"), "Request failed with status 502");
        assert_eq!(status_message(503, r#"{"message":""}"#), "Request failed with status 503");
    }
}
