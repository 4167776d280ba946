//! History-list page

use super::{NavParams, Notice, RequestTracker, Ticket, ViewState};
use crate::history::{HistoryError, HistoryStore};
use crate::model::HistoryEntry;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Message shown when history needs a signed-in user
pub const SIGN_IN_REQUIRED: &str = "Sign in to view your query history.";

/// State of the history page
#[derive(Debug, Default)]
pub struct HistoryPage {
    state: ViewState<Vec<HistoryEntry>>,
    deleting: HashSet<String>,
    /// Rows deleted on this page; kept out of any list fetched before the delete
    removed: HashSet<String>,
    notices: Vec<Notice>,
    tracker: RequestTracker,
    unmounted: bool,
}

impl HistoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<Vec<HistoryEntry>> {
        &self.state
    }

    /// Loaded entries, or nothing while loading or failed
    pub fn entries(&self) -> &[HistoryEntry] {
        self.state.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    /// Start (re)loading the list
    pub fn begin_load(&mut self) -> Ticket {
        self.state = ViewState::Loading;
        self.tracker.issue()
    }

    /// Apply a list outcome. Returns false when the response was stale.
    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<HistoryEntry>, HistoryError>,
    ) -> bool {
        if !self.tracker.is_current(ticket) {
            debug!("Discarding superseded history response");
            return false;
        }

        self.state = match outcome {
            Ok(mut entries) => {
                entries.retain(|entry| !self.removed.contains(&entry.id));
                ViewState::Loaded(entries)
            }
            Err(e) if e.is_auth() => {
                warn!(error = %e, "History requires an authenticated user");
                ViewState::Failed(SIGN_IN_REQUIRED.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load history");
                ViewState::Failed(e.to_string())
            }
        };
        true
    }

    /// Mark a row as deleting. Returns false if it already is.
    pub fn begin_delete(&mut self, id: &str) -> bool {
        self.deleting.insert(id.to_string())
    }

    /// Apply a delete outcome to its row only
    pub fn complete_delete(&mut self, id: &str, outcome: Result<(), HistoryError>) {
        self.deleting.remove(id);
        if self.unmounted {
            return;
        }

        match outcome {
            Ok(()) => {
                self.removed.insert(id.to_string());
                if let ViewState::Loaded(entries) = &mut self.state {
                    entries.retain(|entry| entry.id != id);
                }
                self.notices.push(Notice::info(
                    "Query deleted",
                    "The query has been removed from your history.",
                ));
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete history entry");
                self.notices.push(Notice::error(
                    "Error",
                    "Failed to delete the query. Please try again.",
                ));
            }
        }
    }

    /// Navigation to the result page showing a stored entry
    pub fn view(&self, id: &str) -> Option<NavParams> {
        self.find(id)
            .map(|entry| NavParams::HistoryEntry(Box::new(entry.clone())))
    }

    /// Navigation that runs the stored query again
    pub fn rerun(&self, id: &str) -> Option<NavParams> {
        self.find(id)
            .map(|entry| NavParams::QueryText(entry.query_text.clone()))
    }

    fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries().iter().find(|entry| entry.id == id)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn unmount(&mut self) {
        self.unmounted = true;
        self.tracker.invalidate();
    }
}

/// Drives a [`HistoryPage`] against a history store
#[derive(Clone)]
pub struct HistoryController {
    page: Arc<Mutex<HistoryPage>>,
    store: Arc<dyn HistoryStore>,
}

impl HistoryController {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            page: Arc::new(Mutex::new(HistoryPage::new())),
            store,
        }
    }

    pub fn page(&self) -> &Arc<Mutex<HistoryPage>> {
        &self.page
    }

    /// Load the list; called on mount and to refresh
    pub async fn load(&self) {
        let ticket = self.page.lock().await.begin_load();
        let outcome = self.store.list().await;
        self.page.lock().await.complete_load(ticket, outcome);
    }

    /// Delete one row. A second call for a row already being deleted is ignored.
    pub async fn delete(&self, id: &str) {
        if !self.page.lock().await.begin_delete(id) {
            return;
        }
        let outcome = self.store.remove(id).await;
        self.page.lock().await.complete_delete(id, outcome);
    }

    pub async fn unmount(&self) {
        self.page.lock().await.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::controller::NoticeLevel;
    use crate::history::StoreError;

    fn entry(id: &str, query: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            query_text: query.to_string(),
            created_at: "2025-06-01T12:00:00Z".to_string(),
            result_count: 0,
            results: Vec::new(),
            developer_recommendations: None,
        }
    }

    fn loaded_page() -> HistoryPage {
        let mut page = HistoryPage::new();
        let ticket = page.begin_load();
        assert!(page.complete_load(ticket, Ok(vec![entry("1", "Firebase"), entry("2", "Supabase")])));
        page
    }

    #[test]
    fn test_load_success() {
        let page = loaded_page();
        assert_eq!(page.entries().len(), 2);
    }

    #[test]
    fn test_auth_failure_blocks_page() {
        let mut page = HistoryPage::new();
        let ticket = page.begin_load();
        page.complete_load(ticket, Err(AuthError::NotSignedIn.into()));
        assert_eq!(page.state().error(), Some(SIGN_IN_REQUIRED));
        assert!(page.state().loaded().is_none());
    }

    #[test]
    fn test_store_failure_message() {
        let mut page = HistoryPage::new();
        let ticket = page.begin_load();
        let err = StoreError::Status {
            status: 503,
            message: "database unavailable".to_string(),
        };
        page.complete_load(ticket, Err(err.into()));
        assert_eq!(page.state().error(), Some("database unavailable"));
    }

    #[test]
    fn test_delete_success_removes_row() {
        let mut page = loaded_page();
        assert!(page.begin_delete("1"));
        assert!(page.is_deleting("1"));
        assert!(!page.begin_delete("1"));
        page.complete_delete("1", Ok(()));
        assert!(!page.is_deleting("1"));
        let ids: Vec<_> = page.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["2"]);
        assert_eq!(page.take_notices()[0].title, "Query deleted");
    }

    #[test]
    fn test_delete_failure_keeps_row() {
        let mut page = loaded_page();
        page.begin_delete("2");
        let err = StoreError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        page.complete_delete("2", Err(err.into()));
        assert_eq!(page.entries().len(), 2);
        assert!(page.state().loaded().is_some());
        assert_eq!(page.take_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_delete_unknown_id_leaves_list() {
        let mut page = loaded_page();
        let before = page.entries().to_vec();
        page.begin_delete("missing");
        page.complete_delete("missing", Ok(()));
        assert_eq!(page.entries(), &before[..]);
    }

    #[test]
    fn test_navigation_params() {
        let page = loaded_page();
        match page.view("2") {
            Some(NavParams::HistoryEntry(e)) => assert_eq!(e.query_text, "Supabase"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(page.rerun("1"), Some(NavParams::QueryText("Firebase".to_string())));
        assert_eq!(page.view("nope"), None);
    }

    #[test]
    fn test_delete_during_reload_stays_deleted() {
        let mut page = loaded_page();
        page.begin_delete("1");
        let reload = page.begin_load();
        page.complete_delete("1", Ok(()));
        assert!(page.state().is_loading());

        // The reload's list was read before the delete landed
        assert!(page.complete_load(reload, Ok(vec![entry("1", "Firebase"), entry("2", "Supabase")])));
        let ids: Vec<_> = page.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["2"]);
    }

    #[test]
    fn test_failed_delete_does_not_hide_row() {
        let mut page = loaded_page();
        page.begin_delete("1");
        let reload = page.begin_load();
        page.complete_delete("1", Err(StoreError::Client("offline".to_string()).into()));
        page.complete_load(reload, Ok(vec![entry("1", "Firebase")]));
        assert_eq!(page.entries().len(), 1);
    }

    #[test]
    fn test_stale_load_ignored() {
        let mut page = HistoryPage::new();
        let first = page.begin_load();
        let second = page.begin_load();
        assert!(page.complete_load(second, Ok(vec![entry("1", "Firebase")])));
        assert!(!page.complete_load(first, Ok(Vec::new())));
        assert_eq!(page.entries().len(), 1);
    }
}
