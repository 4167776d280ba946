//! Page view-state controllers
//!
//! Each page owns an explicit [`ViewState`] and moves it through
//! `Idle -> Loading -> {Loaded | Failed} -> Loading -> ...`. Actions that hit
//! the network are split in two: a synchronous `begin` that validates and
//! returns a [`Ticket`], and a `complete` that applies the outcome only if
//! the ticket is still the page's latest. Superseded and post-unmount
//! responses are dropped.
//!
//! The `*Controller` types wrap a page in an `Arc<Mutex<_>>` and drive it
//! against the gateway and history store. The lock is never held across a
//! network call, so requests on the same page may overlap.

pub mod history;
pub mod query;
pub mod result;

pub use history::{HistoryController, HistoryPage};
pub use query::{QueryController, QueryPage};
pub use result::{DetailState, ResultController, ResultPage};

use crate::classify::{classify, Classified};
use crate::gateway::GatewayError;
use crate::model::{AnalysisResponse, HistoryEntry};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum query length accepted by default, in characters
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 200;

/// Page-level state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, ViewState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Loaded(_) => "loaded",
            ViewState::Failed(_) => "failed",
        }
    }
}

/// Rejected user input; never reaches the network
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter a query to analyze competitors")]
    Empty,

    #[error("Query must be {max} characters or less")]
    TooLong { max: usize, len: usize },
}

/// Check a raw query and return the trimmed text to submit
pub fn validate_query(raw: &str, max_len: usize) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let len = raw.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong { max: max_len, len });
    }

    Ok(trimmed.to_string())
}

/// Identifies one request issued by a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Tracks which request a page is waiting on
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    /// Issue a ticket that supersedes every earlier one
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Make every outstanding ticket stale
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// An analysis request a page is waiting on
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnalysis {
    ticket: Ticket,
    query: String,
}

impl PendingAnalysis {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// What happened when a response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Loaded,
    Failed,
    /// A newer request or an unmount made this response irrelevant
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for outcomes that do not change page state
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Parameters carried from one page to another
#[derive(Debug, Clone, PartialEq)]
pub enum NavParams {
    QueryText(String),
    HistoryEntry(Box<HistoryEntry>),
}

/// Everything a page shows once an analysis is available
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub query: String,
    pub results: Classified,
    pub recommendations: Option<String>,
}

impl Analysis {
    pub fn from_response(query: impl Into<String>, response: AnalysisResponse) -> Self {
        Self {
            query: query.into(),
            results: classify(response.competitors),
            recommendations: Some(response.developer_recommendations),
        }
    }

    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            query: entry.query_text.clone(),
            results: classify(entry.results.clone()),
            recommendations: entry.developer_recommendations.clone(),
        }
    }
}

/// Start an analysis: validate, then move to Loading with a fresh ticket
pub(crate) fn begin_analysis(
    state: &mut ViewState<Analysis>,
    tracker: &mut RequestTracker,
    raw: &str,
    max_len: usize,
) -> Result<PendingAnalysis, ValidationError> {
    let query = validate_query(raw, max_len)?;
    *state = ViewState::Loading;
    Ok(PendingAnalysis {
        ticket: tracker.issue(),
        query,
    })
}

/// Apply a gateway outcome if its ticket is still current
pub(crate) fn complete_analysis(
    state: &mut ViewState<Analysis>,
    tracker: &RequestTracker,
    pending: &PendingAnalysis,
    outcome: Result<AnalysisResponse, GatewayError>,
) -> Completion {
    if !tracker.is_current(pending.ticket) {
        info!(query = %pending.query, "Discarding superseded analysis response");
        return Completion::Superseded;
    }

    match outcome {
        Ok(response) => {
            *state = ViewState::Loaded(Analysis::from_response(&pending.query, response));
            Completion::Loaded
        }
        Err(e) => {
            warn!(query = %pending.query, error = %e, "Analysis failed");
            *state = ViewState::Failed(e.to_string());
            Completion::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        assert_eq!(validate_query("  Firebase \n", 200), Ok("Firebase".to_string()));
        assert_eq!(validate_query("", 200), Err(ValidationError::Empty));
        assert_eq!(validate_query(" \t\n ", 200), Err(ValidationError::Empty));

        let long = "a".repeat(201);
        assert_eq!(
            validate_query(&long, 200),
            Err(ValidationError::TooLong { max: 200, len: 201 })
        );
        assert!(validate_query(&"a".repeat(200), 200).is_ok());
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let query = "é".repeat(200);
        assert!(validate_query(&query, 200).is_ok());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::Empty.to_string(),
            "Please enter a query to analyze competitors"
        );
        assert_eq!(
            ValidationError::TooLong { max: 200, len: 250 }.to_string(),
            "Query must be 200 characters or less"
        );
    }

    #[test]
    fn test_request_tracker() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        tracker.invalidate();
        assert!(!tracker.is_current(second));
    }

    #[test]
    fn test_analysis_from_entry_without_results() {
        let entry = HistoryEntry {
            id: "1".to_string(),
            query_text: "Firebase".to_string(),
            created_at: String::new(),
            result_count: 3,
            results: Vec::new(),
            developer_recommendations: None,
        };
        let analysis = Analysis::from_entry(&entry);
        assert_eq!(analysis.query, "Firebase");
        assert!(analysis.results.is_empty());
        assert_eq!(analysis.recommendations, None);
    }
}
