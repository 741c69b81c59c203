//! Session holder
//!
//! Follows the auth provider's session channel and keeps the display name in
//! step with it: derived from the email on first sight, then read back from
//! storage, editable by the user.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tweeter_backend::AuthApi;
use tweeter_common::{ClientError, Identity, Result, Session};

use crate::storage::KeyValueStore;

/// Storage key of the display name
pub const DISPLAY_NAME_KEY: &str = "userName";

/// What the view layer sees. `display_name` is `None` whenever `identity` is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub display_name: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

pub struct SessionHolder {
    storage: Arc<dyn KeyValueStore>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl SessionHolder {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::default());
        Self { storage, state_tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state_tx.borrow().identity.clone()
    }

    pub fn display_name(&self) -> Option<String> {
        self.state_tx.borrow().display_name.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Stored display name, without consulting the backend
    pub fn restore(&self) -> Option<String> {
        match self.storage.get(DISPLAY_NAME_KEY) {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Failed to read stored display name");
                None
            }
        }
    }

    /// Apply a session change from the auth provider.
    ///
    /// Storage failures never block sign-in: the derived name is used for
    /// this run and the failure is logged.
    pub fn observe(&self, session: Option<&Session>) -> SessionSnapshot {
        let snapshot = match session {
            Some(session) => {
                let identity = session.user.clone();
                let display_name = self.restore().unwrap_or_else(|| {
                    let derived = identity.default_display_name();
                    if let Err(e) = self.storage.set(DISPLAY_NAME_KEY, &derived) {
                        warn!(error = %e, "Failed to persist default display name");
                    }
                    debug!(display_name = %derived, "Derived default display name");
                    derived
                });

                SessionSnapshot {
                    identity: Some(identity),
                    display_name: Some(display_name),
                }
            }
            None => SessionSnapshot::default(),
        };

        self.state_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Persist a new display name and apply it immediately
    pub fn set_display_name(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation(
                "display name must not be empty".to_string(),
            ));
        }
        if self.identity().is_none() {
            return Err(ClientError::Unauthenticated(
                "no active session".to_string(),
            ));
        }

        self.storage.set(DISPLAY_NAME_KEY, name)?;
        self.state_tx.send_modify(|state| {
            state.display_name = Some(name.to_string());
        });

        info!(display_name = %name, "Display name updated");
        Ok(())
    }

    /// Apply the receiver's current value, then every change until the
    /// sender goes away.
    pub fn listen(self: &Arc<Self>, mut rx: watch::Receiver<Option<Session>>) -> JoinHandle<()> {
        let holder = Arc::clone(self);
        tokio::spawn(async move {
            let current = rx.borrow_and_update().clone();
            holder.observe(current.as_ref());

            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                let snapshot = holder.observe(session.as_ref());
                debug!(
                    authenticated = snapshot.is_authenticated(),
                    "Session change applied"
                );
            }
        })
    }

    /// Follow an auth provider's session channel
    pub fn attach(self: &Arc<Self>, auth: &dyn AuthApi) -> JoinHandle<()> {
        self.listen(auth.subscribe())
    }
}
