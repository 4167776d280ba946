//! Submit-query page

use super::{
    begin_analysis, complete_analysis, Analysis, Completion, Notice, PendingAnalysis,
    RequestTracker, ValidationError, ViewState, DEFAULT_MAX_QUERY_LENGTH,
};
use crate::gateway::{AnalysisGateway, GatewayError};
use crate::history::{HistoryError, HistoryStore};
use crate::model::AnalysisResponse;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// State of the submit-query page
#[derive(Debug)]
pub struct QueryPage {
    state: ViewState<Analysis>,
    input: String,
    validation: Option<ValidationError>,
    notices: Vec<Notice>,
    tracker: RequestTracker,
    max_query_length: usize,
    mounted: bool,
}

impl Default for QueryPage {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUERY_LENGTH)
    }
}

impl QueryPage {
    pub fn new(max_query_length: usize) -> Self {
        Self {
            state: ViewState::Idle,
            input: String::new(),
            validation: None,
            notices: Vec::new(),
            tracker: RequestTracker::default(),
            max_query_length,
            mounted: true,
        }
    }

    /// Open the page pre-filled with a query to run again
    pub fn with_rerun(max_query_length: usize, query: impl Into<String>) -> Self {
        let mut page = Self::new(max_query_length);
        page.input = query.into();
        page
    }

    pub fn state(&self) -> &ViewState<Analysis> {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        self.validation.as_ref()
    }

    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    /// Update the input; a non-blank value clears a shown validation message
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        if self.validation.is_some() && !self.input.trim().is_empty() {
            self.validation = None;
        }
    }

    /// Validate `raw` and move to Loading. On rejection the state is left
    /// untouched and the validation message is recorded.
    pub fn begin(&mut self, raw: &str) -> Result<PendingAnalysis, ValidationError> {
        self.input = raw.to_string();
        match begin_analysis(&mut self.state, &mut self.tracker, raw, self.max_query_length) {
            Ok(pending) => {
                self.validation = None;
                Ok(pending)
            }
            Err(e) => {
                self.validation = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Apply the gateway outcome for `pending`
    pub fn complete(
        &mut self,
        pending: &PendingAnalysis,
        outcome: Result<AnalysisResponse, GatewayError>,
    ) -> Completion {
        let completion = complete_analysis(&mut self.state, &self.tracker, pending, outcome);
        match completion {
            Completion::Loaded => {
                let found = self.state.loaded().map(|a| a.results.len()).unwrap_or(0);
                self.notices.push(Notice::info(
                    "Analysis complete",
                    format!("Found {} competitors for your query.", found),
                ));
            }
            Completion::Failed => self.notices.push(Notice::error(
                "Analysis failed",
                "There was an error analyzing competitors. Please try again.",
            )),
            Completion::Superseded => {}
        }
        completion
    }

    /// Record the outcome of saving a loaded analysis. Never changes the state.
    pub fn record_save(&mut self, result: Result<(), HistoryError>) {
        if !self.mounted {
            return;
        }
        if let Err(e) = result {
            let description = if e.is_auth() {
                "Sign in to keep a history of your queries.".to_string()
            } else {
                format!("Results are shown but were not saved to history: {}", e)
            };
            self.notices.push(Notice::error("Could not save query", description));
        }
    }

    /// Drain pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Leave the page; outstanding responses are dropped on arrival
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.tracker.invalidate();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

/// Drives a [`QueryPage`] against a gateway and a history store
#[derive(Clone)]
pub struct QueryController {
    page: Arc<Mutex<QueryPage>>,
    gateway: Arc<dyn AnalysisGateway>,
    store: Arc<dyn HistoryStore>,
}

impl QueryController {
    pub fn new(
        page: QueryPage,
        gateway: Arc<dyn AnalysisGateway>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            gateway,
            store,
        }
    }

    pub fn page(&self) -> &Arc<Mutex<QueryPage>> {
        &self.page
    }

    /// Submit a query: analyze, show the results, then save them to history.
    ///
    /// A save failure leaves the results on screen and adds an error notice.
    pub async fn submit(&self, raw: &str) -> Result<Completion, ValidationError> {
        let pending = self.page.lock().await.begin(raw)?;
        info!(query = pending.query(), "Submitting query");

        let outcome = self.gateway.analyze(pending.query()).await;
        let to_save = outcome.as_ref().ok().cloned();

        let completion = self.page.lock().await.complete(&pending, outcome);

        if let (Completion::Loaded, Some(response)) = (completion, to_save) {
            let saved = self
                .store
                .save(
                    pending.query(),
                    &response.competitors,
                    Some(&response.developer_recommendations),
                )
                .await;
            if let Err(e) = &saved {
                warn!(query = pending.query(), error = %e, "Failed to save query to history");
            }
            self.page.lock().await.record_save(saved);
        }

        Ok(completion)
    }

    pub async fn unmount(&self) {
        self.page.lock().await.unmount();
    }
}
