//! Tweeter backend client
//!
//! The hosted backend provides managed auth and managed table access. The
//! client only depends on the two traits below:
//! - [`PostsApi`] lists and creates posts
//! - [`AuthApi`] owns the session and broadcasts session changes
//!
//! [`RestBackend`] talks to the hosted service over HTTP; [`InMemoryBackend`]
//! keeps everything in process for offline use and tests.

mod memory;
mod rest;

pub use memory::InMemoryBackend;
pub use rest::RestBackend;

use async_trait::async_trait;
use tokio::sync::watch;
use tweeter_common::{Post, PostDraft, Result, Session};

/// Post table access
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// All posts, newest first
    async fn list_posts(&self) -> Result<Vec<Post>>;

    /// Persist one post and return the stored record with its assigned id
    async fn create_post(&self, draft: &PostDraft) -> Result<Post>;
}

/// Session provider
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Current session, if any
    fn get_session(&self) -> Option<Session>;

    /// Receiver that observes every login and logout
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// End the session. The local session is cleared even when the remote
    /// call fails.
    async fn sign_out(&self) -> Result<()>;
}
