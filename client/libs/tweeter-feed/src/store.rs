//! Feed store
//!
//! One store exists per mounted feed of an authenticated session. It owns the
//! post list, talks to [`PostsApi`] and publishes a [`FeedSnapshot`] after
//! every transition.
//!
//! Write protocol for [`FeedStore::add_post`]:
//! 1. prepend a pending post carrying a temporary id
//! 2. send the draft to the backend
//! 3. swap the pending entry for the stored record, or remove it on failure

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tweeter_backend::PostsApi;
use tweeter_common::models::new_temporary_id;
use tweeter_common::{FeedConfig, Post, PostDraft, Result};

use crate::metrics::FeedMetrics;
use crate::state::{FeedSnapshot, FeedState};

pub struct FeedStore {
    api: Arc<dyn PostsApi>,
    config: FeedConfig,
    author: RwLock<String>,
    state: Mutex<FeedState>,
    updates: watch::Sender<FeedSnapshot>,
    poller: Mutex<Option<JoinHandle<()>>>,
    metrics: FeedMetrics,
}

impl FeedStore {
    /// Create an idle store; nothing is fetched and no poller runs
    pub fn new(api: Arc<dyn PostsApi>, author: impl Into<String>, config: FeedConfig) -> Arc<Self> {
        let (updates, _) = watch::channel(FeedSnapshot::default());
        if config.poll_interval_secs < FeedConfig::MIN_POLL_INTERVAL_SECS {
            warn!(
                configured = config.poll_interval_secs,
                used = FeedConfig::MIN_POLL_INTERVAL_SECS,
                "Poll interval too short; clamped"
            );
        }

        Arc::new(Self {
            api,
            config,
            author: RwLock::new(author.into()),
            state: Mutex::new(FeedState::default()),
            updates,
            poller: Mutex::new(None),
            metrics: FeedMetrics::new(),
        })
    }

    /// Create a store, arm the poller and run the initial foreground load.
    ///
    /// A failed initial load is reported through the snapshot's `error`.
    pub async fn start(
        api: Arc<dyn PostsApi>,
        author: impl Into<String>,
        config: FeedConfig,
    ) -> Arc<Self> {
        let store = Self::new(api, author, config);
        store.start_polling();
        let _ = store.refresh().await;
        store
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.updates.borrow().clone()
    }

    /// Receiver notified after every state transition
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    pub fn author(&self) -> String {
        self.author.read().clone()
    }

    /// Name used for posts created from now on
    pub fn set_author(&self, author: impl Into<String>) {
        *self.author.write() = author.into();
    }

    pub fn clear_error(&self) {
        self.update(FeedState::clear_error);
    }

    /// Foreground refresh: shows loading, reports failures, keeps the
    /// current posts when the fetch fails.
    pub async fn refresh(&self) -> Result<usize> {
        self.update(FeedState::begin_refresh);

        match self.api.list_posts().await {
            Ok(posts) => {
                let count = posts.len();
                self.update(|state| {
                    state.finish_refresh(posts, self.config.refresh_policy, self.config.sort_fallback)
                });
                self.metrics.record_refresh(false, true);
                debug!(count, "Feed refreshed");
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "Failed to load feed");
                self.update(FeedState::fail_refresh);
                self.metrics.record_refresh(false, false);
                Err(e)
            }
        }
    }

    /// Background refresh: replaces posts on success, otherwise logs and
    /// leaves every field untouched.
    pub async fn refresh_silent(&self) {
        match self.api.list_posts().await {
            Ok(posts) => {
                let count = posts.len();
                self.update(|state| {
                    state.apply_fetched(posts, self.config.refresh_policy, self.config.sort_fallback)
                });
                self.metrics.record_refresh(true, true);
                debug!(count, "Silent feed refresh applied");
            }
            Err(e) => {
                warn!(error = %e, "Silent feed refresh failed");
                self.metrics.record_refresh(true, false);
            }
        }
    }

    /// Publish a post optimistically.
    ///
    /// The pending entry is visible before the backend answers. The returned
    /// result mirrors what already happened to the state.
    pub async fn add_post(&self, content: &str) -> Result<Post> {
        let draft = PostDraft::new(content, self.author());
        let temp_id = new_temporary_id();

        let in_flight = self.update(|state| {
            state.begin_post(Post::pending(&draft, temp_id.clone()));
            state.pending_len()
        });
        self.metrics.record_post_started();
        debug!(temp_id = %temp_id, in_flight, "Pending post added");

        match self.api.create_post(&draft).await {
            Ok(stored) => {
                self.update(|state| state.confirm_post(&temp_id, stored.clone()));
                self.metrics.record_post_settled(true);
                info!(post_id = %stored.id, temp_id = %temp_id, "Post confirmed");
                Ok(stored)
            }
            Err(e) => {
                error!(temp_id = %temp_id, error = %e, "Failed to create post; rolled back");
                self.update(|state| state.rollback_post(&temp_id));
                self.metrics.record_post_settled(false);
                Err(e)
            }
        }
    }

    /// Arm the silent poller. Re-arming aborts the previous task, so at most
    /// one poller runs per store. The task holds only a weak reference and
    /// exits once the store is gone.
    pub fn start_polling(self: &Arc<Self>) {
        let period = self.config.poll_interval();
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.refresh_silent().await;
            }
        });

        if let Some(previous) = self.poller.lock().replace(handle) {
            previous.abort();
            debug!("Replaced running feed poller");
        }
        info!(interval_secs = period.as_secs(), "Feed poller armed");
    }

    /// Disarm the poller. Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
            info!("Feed poller stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Apply a transition and publish the result while still holding the
    /// lock, so subscribers observe transitions in order.
    fn update<R>(&self, f: impl FnOnce(&mut FeedState) -> R) -> R {
        let mut state = self.state.lock();
        let out = f(&mut *state);
        self.updates.send_replace(state.snapshot().clone());
        out
    }
}

impl Drop for FeedStore {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}
