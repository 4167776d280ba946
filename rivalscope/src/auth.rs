//! Authenticated identity for history operations
//!
//! Sign-in and sign-out happen elsewhere; this module only answers "who is
//! the current user" from an access token or a fixed session.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors resolving the current user
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User not authenticated")]
    NotSignedIn,

    #[error("Session rejected: {0}")]
    InvalidSession(String),

    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The authenticated user as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    /// Bearer token for row-level access; `None` falls back to the anon key
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Source of the current authenticated user
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<Session, AuthError>;
}

/// A session fixed at construction, or none at all
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    session: Option<Session>,
}

impl StaticAuth {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<Session, AuthError> {
        self.session.clone().ok_or(AuthError::NotSignedIn)
    }
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

/// Resolves the user behind an access token via `GET /auth/v1/user`
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseAuth {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn current_user(&self) -> Result<Session, AuthError> {
        let token = self.access_token.as_ref().ok_or(AuthError::NotSignedIn)?;

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: UserResponse = response.json().await?;
                debug!(user_id = %user.id, "Resolved authenticated user");
                Ok(Session::new(user.id).with_token(token.clone()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidSession(
                "access token is expired or invalid".to_string(),
            )),
            status => Err(AuthError::InvalidSession(format!("auth returned HTTP {}", status))),
        }
    }
}
