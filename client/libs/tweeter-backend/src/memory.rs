//! In-process backend
//!
//! Holds posts and accounts in memory. Used for offline mode and as the
//! collaborator in feed and session tests, where failures can be injected
//! and writes held in flight.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;
use tracing::debug;
use tweeter_common::{ClientError, Identity, Post, PostDraft, Result, Session};
use uuid::Uuid;

use crate::{AuthApi, PostsApi};

pub struct InMemoryBackend {
    posts: Mutex<Vec<Post>>,
    next_id: AtomicU64,
    list_failure: Mutex<Option<ClientError>>,
    create_failure: Mutex<Option<ClientError>>,
    writes_paused: watch::Sender<bool>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    accounts: Mutex<HashMap<String, (Identity, String)>>,
    session_tx: watch::Sender<Option<Session>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (writes_paused, _) = watch::channel(false);
        let (session_tx, _) = watch::channel(None);

        Self {
            posts: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            list_failure: Mutex::new(None),
            create_failure: Mutex::new(None),
            writes_paused,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            accounts: Mutex::new(HashMap::new()),
            session_tx,
        }
    }

    /// Seed stored posts; `list_posts` returns them newest first
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        *self.posts.lock() = posts;
        self
    }

    /// Register an account that can sign in with a password
    pub fn with_account(self, email: &str, password: &str) -> Self {
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.accounts
            .lock()
            .insert(email.to_string(), (identity, password.to_string()));
        self
    }

    /// Id assigned to the next created post
    pub fn set_next_id(&self, id: u64) {
        self.next_id.store(id, Ordering::SeqCst);
    }

    /// Store a post as if another client had written it
    pub fn insert_remote(&self, post: Post) {
        self.posts.lock().push(post);
    }

    pub fn set_list_failure(&self, failure: Option<ClientError>) {
        *self.list_failure.lock() = failure;
    }

    pub fn set_create_failure(&self, failure: Option<ClientError>) {
        *self.create_failure.lock() = failure;
    }

    /// Hold every `create_post` call until [`resume_writes`](Self::resume_writes)
    pub fn pause_writes(&self) {
        self.writes_paused.send_replace(true);
    }

    pub fn resume_writes(&self) {
        self.writes_paused.send_replace(false);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn stored_posts(&self) -> Vec<Post> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl PostsApi for InMemoryBackend {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.list_failure.lock().clone() {
            return Err(err);
        }

        let mut posts = self.posts.lock().clone();
        // Newest first; later inserts win ties
        posts.reverse();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mut paused = self.writes_paused.subscribe();
        let released = paused.wait_for(|held| !*held).await.is_ok();
        if !released {
            return Err(ClientError::Network("backend shut down".to_string()));
        }

        if let Some(err) = self.create_failure.lock().clone() {
            return Err(err);
        }

        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            content: draft.content.clone(),
            author: draft.author.clone(),
            created_at: draft.created_at,
        };

        self.posts.lock().push(post.clone());
        debug!(post_id = %post.id, "Stored post in memory");
        Ok(post)
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    fn get_session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let identity = match self.accounts.lock().get(email) {
            Some((identity, expected)) if expected == password => identity.clone(),
            _ => {
                return Err(ClientError::Unauthenticated(
                    "Invalid login credentials".to_string(),
                ))
            }
        };

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: None,
            user: identity,
        };
        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.session_tx.send_replace(None);
        Ok(())
    }
}
