//! Application shell
//!
//! Owns the current route, keeps the feed store mounted only while the feed
//! view is shown to a signed-in user, and forwards user actions to the
//! session holder and the feed store.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tweeter_backend::{AuthApi, PostsApi};
use tweeter_common::{ClientError, Config, Post, Result};
use tweeter_feed::{FeedSnapshot, FeedStore};
use tweeter_session::{KeyValueStore, SessionHolder};

use crate::routes::{self, Route};
use crate::view;

pub struct App {
    config: Config,
    posts: Arc<dyn PostsApi>,
    auth: Arc<dyn AuthApi>,
    session: Arc<SessionHolder>,
    feed: Option<Arc<FeedStore>>,
    route: Route,
    listener: JoinHandle<()>,
}

impl App {
    pub fn new(
        config: Config,
        posts: Arc<dyn PostsApi>,
        auth: Arc<dyn AuthApi>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let session = Arc::new(SessionHolder::new(storage));
        // Apply whatever the provider already holds before the first render
        session.observe(auth.get_session().as_ref());
        let listener = session.attach(auth.as_ref());

        Self {
            config,
            posts,
            auth,
            session,
            feed: None,
            route: Route::Login,
            listener,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> &Arc<SessionHolder> {
        &self.session
    }

    pub fn feed(&self) -> Option<&Arc<FeedStore>> {
        self.feed.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.snapshot().is_authenticated()
    }

    /// Resolve `path` through the guard and mount or unmount the feed
    pub async fn navigate(&mut self, path: &str) -> Route {
        let target = routes::navigate(path, self.is_authenticated());

        if target != Route::Feed {
            self.unmount_feed();
        } else if self.feed.is_none() {
            let author = self.session.display_name().unwrap_or_default();
            let store =
                FeedStore::start(Arc::clone(&self.posts), author, self.config.feed.clone()).await;
            self.feed = Some(store);
        }

        self.route = target;
        target
    }

    /// Re-run the guard after the session may have changed underneath us
    pub async fn sync_session(&mut self) -> Route {
        let path = self.route.path();
        self.navigate(path).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Route> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.session.observe(Some(&session));
        info!(user_id = %session.user.id, "Signed in");
        Ok(self.navigate(Route::Feed.path()).await)
    }

    pub async fn logout(&mut self) -> Route {
        if let Err(e) = self.auth.sign_out().await {
            warn!(error = %e, "Sign-out did not complete cleanly");
        }
        self.session.observe(None);
        self.unmount_feed();
        self.navigate(Route::Login.path()).await
    }

    pub async fn post(&self, content: &str) -> Result<Post> {
        let feed = self.mounted_feed()?;
        feed.add_post(content).await
    }

    /// Start a post in the background. The pending entry shows up on the
    /// feed's update channel while the write is in flight.
    pub fn spawn_post(&self, content: &str) -> Result<JoinHandle<Result<Post>>> {
        let feed = Arc::clone(self.mounted_feed()?);
        let content = content.to_string();

        Ok(tokio::spawn(async move {
            let outcome = feed.add_post(&content).await;
            if let Err(e) = &outcome {
                warn!(error = %e, "Post rejected");
            }
            outcome
        }))
    }

    /// Updates of the mounted feed, if any
    pub fn feed_updates(&self) -> Option<watch::Receiver<FeedSnapshot>> {
        self.feed.as_ref().map(|feed| feed.subscribe())
    }

    /// Current view rendered as text
    pub fn screen(&self) -> String {
        let feed = self.feed.as_ref().map(|store| store.snapshot());
        view::render(self.route, &self.session.snapshot(), feed.as_ref())
    }

    pub async fn refresh(&self) -> Result<usize> {
        let feed = self.mounted_feed()?;
        feed.refresh().await
    }

    pub fn dismiss_error(&self) {
        if let Some(feed) = &self.feed {
            feed.clear_error();
        }
    }

    /// Rename the user; posts created afterwards carry the new name
    pub fn rename(&self, name: &str) -> Result<()> {
        self.session.set_display_name(name)?;
        if let (Some(feed), Some(current)) = (&self.feed, self.session.display_name()) {
            feed.set_author(current);
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.unmount_feed();
    }

    fn mounted_feed(&self) -> Result<&Arc<FeedStore>> {
        self.feed.as_ref().ok_or_else(|| {
            ClientError::Validation("the feed is not open; go to / first".to_string())
        })
    }

    fn unmount_feed(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.shutdown();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.unmount_feed();
        self.listener.abort();
    }
}
