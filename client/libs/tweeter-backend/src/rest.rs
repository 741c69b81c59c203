//! HTTP client for the hosted backend
//!
//! Table access goes through `/rest/v1/{table}`, auth through `/auth/v1/*`.
//! Every request carries the public key as `apikey` and a bearer token: the
//! session's access token when signed in, the public key otherwise.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tweeter_common::{BackendConfig, ClientError, Identity, Post, PostDraft, Result, Session};

use crate::{AuthApi, PostsApi};

/// Hosted backend client
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    posts_table: String,
    session_tx: watch::Sender<Option<Session>>,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: Identity,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client build failed: {}", e)))?;

        let (session_tx, _) = watch::channel(None);

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            posts_table: config.posts_table.clone(),
            session_tx,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.posts_table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    fn bearer(&self) -> String {
        self.session_tx
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    /// Turn non-success responses into `ClientError::Api`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated(message));
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PostsApi for RestBackend {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let response = self
            .authorize(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "date.desc")])
            .send()
            .await?;

        let posts = Self::check(response)
            .await?
            .json::<Option<Vec<Post>>>()
            .await?
            .unwrap_or_default();

        debug!(count = posts.len(), "Fetched posts");
        Ok(posts)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        let response = self
            .authorize(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&[draft])
            .send()
            .await?;

        let stored = Self::check(response)
            .await?
            .json::<Vec<Post>>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Decode("insert returned no rows".to_string()))?;

        debug!(post_id = %stored.id, "Created post");
        Ok(stored)
    }
}

#[async_trait]
impl AuthApi for RestBackend {
    fn get_session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let token = match Self::check(response).await {
            Ok(response) => response.json::<TokenResponse>().await?,
            Err(ClientError::Api { status: 400, message }) => {
                return Err(ClientError::Unauthenticated(message));
            }
            Err(e) => return Err(e),
        };

        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user,
        };

        info!(user_id = %session.user.id, "Signed in");
        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session_tx.send_replace(None) else {
            return Ok(());
        };

        info!(user_id = %session.user.id, "Signed out");

        let result = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await;

        match result {
            Ok(response) => Self::check(response).await.map(|_| ()),
            Err(e) => {
                warn!(error = %e, "Remote sign-out failed; local session already cleared");
                Err(e.into())
            }
        }
    }
}
