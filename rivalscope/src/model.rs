//! Canonical result and history types shared by the clients and controllers

use serde::{Deserialize, Serialize};

/// One competitor candidate returned by the analysis gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorResult {
    /// Unique within one result set
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// May be empty
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub pricing_model: Option<String>,
    /// `None` when the gateway did not say either way
    #[serde(default)]
    pub is_open_source: Option<bool>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub language_support: Option<Vec<String>>,
    #[serde(default)]
    pub api_available: Option<String>,
    #[serde(default)]
    pub integration_capabilities: Option<Vec<String>>,
    /// Computed client-side, never taken from the gateway
    #[serde(default)]
    pub is_best: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CompetitorResult {
    /// Create a result with every optional field unset
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            website: String::new(),
            pricing_model: None,
            is_open_source: None,
            tech_stack: None,
            language_support: None,
            api_available: None,
            integration_capabilities: None,
            is_best: false,
            reason: None,
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    pub fn with_best(mut self, is_best: bool) -> Self {
        self.is_best = is_best;
        self
    }
}

/// Full gateway payload after validation and mapping
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub competitors: Vec<CompetitorResult>,
    pub developer_recommendations: String,
}

/// A persisted record of a past query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Assigned by the store
    pub id: String,
    pub query_text: String,
    /// RFC 3339, assigned by the store; empty when the row had none
    pub created_at: String,
    /// Cached length of `results` as written at save time
    pub result_count: u64,
    pub results: Vec<CompetitorResult>,
    pub developer_recommendations: Option<String>,
}
