//! PostgREST-backed history store (Supabase `rest/v1`)

use super::{HistoryError, HistoryRow, HistoryStore, NewHistoryRow, StoreError};
use crate::auth::{AuthError, AuthProvider};
use crate::model::{CompetitorResult, HistoryEntry};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// History table reached through PostgREST
pub struct RestHistoryStore {
    client: Client,
    base_url: String,
    anon_key: String,
    table: String,
    auth: Arc<dyn AuthProvider>,
}

impl RestHistoryStore {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        table: impl Into<String>,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            table: table.into(),
            auth,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Attach the API key and the bearer token (user token, else anon key)
    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }
}

/// Turn a non-success response into a [`StoreError::Status`]
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(v) => v
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Store request failed with status {}", status.as_u16())),
        Err(_) => format!("Store request failed with status {}", status.as_u16()),
    };
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl HistoryStore for RestHistoryStore {
    async fn save(
        &self,
        query: &str,
        results: &[CompetitorResult],
        recommendations: Option<&str>,
    ) -> Result<(), HistoryError> {
        let session = self.auth.current_user().await?;
        let row = NewHistoryRow::new(&session.user_id, query, results, recommendations);

        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(&row);
        let response = self
            .authorize(request, session.access_token.as_deref())
            .send()
            .await
            .map_err(StoreError::from)?;
        check(response).await?;

        info!(user_id = %session.user_id, query, results = results.len(), "Saved query to history");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let session = self.auth.current_user().await?;

        let request = self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", session.user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = self
            .authorize(request, session.access_token.as_deref())
            .send()
            .await
            .map_err(StoreError::from)?;
        let body = check(response).await?.text().await.map_err(StoreError::from)?;

        let rows: Vec<HistoryRow> =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(user_id = %session.user_id, rows = rows.len(), "Fetched history");

        Ok(rows.into_iter().map(HistoryRow::into_entry).collect())
    }

    async fn remove(&self, id: &str) -> Result<(), HistoryError> {
        // Ownership is the backend's policy; a signed-out caller still tries with the anon key.
        let token = match self.auth.current_user().await {
            Ok(session) => session.access_token,
            Err(AuthError::NotSignedIn) => None,
            Err(e) => return Err(e.into()),
        };

        let request = self
            .client
            .delete(self.table_url())
            .query(&[("id", format!("eq.{}", id))]);
        let response = self
            .authorize(request, token.as_deref())
            .send()
            .await
            .map_err(StoreError::from)?;
        check(response).await?;

        info!(id, "Deleted history entry");
        Ok(())
    }
}
