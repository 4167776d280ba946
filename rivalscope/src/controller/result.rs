//! Result-detail page
//!
//! Shows a stored history entry as-is, or runs a query again without saving
//! it. Opened with neither, the page sits in [`DetailState::NoInput`].

use super::{
    begin_analysis, complete_analysis, Analysis, Completion, NavParams, PendingAnalysis,
    RequestTracker, ValidationError, ViewState,
};
use crate::gateway::{AnalysisGateway, GatewayError};
use crate::model::AnalysisResponse;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Guidance shown when the page was opened without a query or entry
pub const NO_INPUT_GUIDANCE: &str =
    "No query selected. Pick an entry from your history or submit a new query.";

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Terminal: nothing to show or fetch
    NoInput,
    View(ViewState<Analysis>),
}

/// State of the result-detail page
#[derive(Debug)]
pub struct ResultPage {
    state: DetailState,
    query: Option<String>,
    validation: Option<ValidationError>,
    tracker: RequestTracker,
    max_query_length: usize,
}

impl ResultPage {
    /// Open the page from navigation parameters
    pub fn mount(params: Option<NavParams>, max_query_length: usize) -> Self {
        let (state, query) = match params {
            Some(NavParams::HistoryEntry(entry)) => (
                DetailState::View(ViewState::Loaded(Analysis::from_entry(&entry))),
                Some(entry.query_text),
            ),
            Some(NavParams::QueryText(text)) => (DetailState::View(ViewState::Idle), Some(text)),
            None => (DetailState::NoInput, None),
        };
        debug!(state = state_name(&state), "Result page mounted");

        Self {
            state,
            query,
            validation: None,
            tracker: RequestTracker::default(),
            max_query_length,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// The view state, unless the page has no input
    pub fn view(&self) -> Option<&ViewState<Analysis>> {
        match &self.state {
            DetailState::View(view) => Some(view),
            DetailState::NoInput => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        self.validation.as_ref()
    }

    /// Start fetching when the page was opened with query text and is not
    /// already showing data. `Ok(None)` means there is nothing to fetch.
    pub fn begin(&mut self) -> Result<Option<PendingAnalysis>, ValidationError> {
        let (view, query) = match (&mut self.state, &self.query) {
            (DetailState::View(view), Some(query)) if view.loaded().is_none() => (view, query),
            _ => return Ok(None),
        };

        match begin_analysis(view, &mut self.tracker, query, self.max_query_length) {
            Ok(pending) => Ok(Some(pending)),
            Err(e) => {
                self.validation = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn complete(
        &mut self,
        pending: &PendingAnalysis,
        outcome: Result<AnalysisResponse, GatewayError>,
    ) -> Completion {
        match &mut self.state {
            DetailState::View(view) => complete_analysis(view, &self.tracker, pending, outcome),
            DetailState::NoInput => Completion::Superseded,
        }
    }

    pub fn unmount(&mut self) {
        self.tracker.invalidate();
    }
}

fn state_name(state: &DetailState) -> &'static str {
    match state {
        DetailState::NoInput => "no-input",
        DetailState::View(view) => view.name(),
    }
}

/// Drives a [`ResultPage`] against a gateway. Never writes history.
#[derive(Clone)]
pub struct ResultController {
    page: Arc<Mutex<ResultPage>>,
    gateway: Arc<dyn AnalysisGateway>,
}

impl ResultController {
    pub fn new(page: ResultPage, gateway: Arc<dyn AnalysisGateway>) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            gateway,
        }
    }

    /// Open from navigation parameters, rejecting query text longer than
    /// `max_query_length`
    pub fn open(
        params: Option<NavParams>,
        max_query_length: usize,
        gateway: Arc<dyn AnalysisGateway>,
    ) -> Self {
        Self::new(ResultPage::mount(params, max_query_length), gateway)
    }

    pub fn page(&self) -> &Arc<Mutex<ResultPage>> {
        &self.page
    }

    /// Fetch if the page needs it. `Ok(None)` when nothing was fetched.
    pub async fn load(&self) -> Result<Option<Completion>, ValidationError> {
        let pending = match self.page.lock().await.begin()? {
            Some(pending) => pending,
            None => return Ok(None),
        };

        let outcome = self.gateway.analyze(pending.query()).await;
        Ok(Some(self.page.lock().await.complete(&pending, outcome)))
    }

    pub async fn unmount(&self) {
        self.page.lock().await.unmount();
    }
}
