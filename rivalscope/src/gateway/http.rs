//! HTTP analysis gateway

use super::{parse_response, status_message, AnalysisGateway, GatewayError, ResearchRequest, RESEARCH_PATH};
use crate::model::AnalysisResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Gateway reached over HTTP at a fixed base URL
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway client with the given transport timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    async fn analyze(&self, query: &str) -> Result<AnalysisResponse, GatewayError> {
        let url = format!("{}{}", self.base_url, RESEARCH_PATH);
        info!(query, "Analyzing competitors");

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&ResearchRequest {
                query: query.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let message = status_message(status.as_u16(), &body);
            warn!(
                status = status.as_u16(),
                duration_ms,
                error = %message,
                "Gateway returned an error"
            );
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parse_response(&body);
        match &parsed {
            Ok(analysis) => debug!(
                competitors = analysis.competitors.len(),
                duration_ms,
                "Gateway response mapped"
            ),
            Err(e) => warn!(error = %e, body_len = body.len(), "Gateway response rejected"),
        }
        parsed
    }
}
