pub mod auth;
pub mod home;
pub mod reviews;
pub mod walks;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionStore;

pub use auth::{AuthState, LoginController, RegisterController};
pub use home::HomeController;
pub use reviews::ReviewsController;
pub use walks::{WalkList, WalksController};

/// Notice produced by a one-shot user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(String),
    Failed(String),
    /// Another action on the same screen was still in flight; nothing was sent.
    Busy,
}

impl ActionOutcome {
    pub fn message(&self) -> &str {
        match self {
            ActionOutcome::Completed(message) | ActionOutcome::Failed(message) => message,
            ActionOutcome::Busy => "Acción en curso",
        }
    }
}

/// Holds an "action in progress" flag for as long as it lives. Acquiring a
/// flag that is already set fails immediately; there is no waiting.
pub(crate) struct ActionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ActionGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A screen whose content is fetched on activation.
#[async_trait]
pub trait Screen: Send + Sync {
    async fn load(&self);
}

/// Loads `screen` now and again every time the session token changes.
/// Aborting the returned handle stands for tearing the screen down.
pub fn activate<S>(screen: Arc<S>, session: &SessionStore) -> JoinHandle<()>
where
    S: Screen + 'static,
{
    let mut token = session.subscribe();
    tokio::spawn(async move {
        loop {
            token.borrow_and_update();
            screen.load().await;
            if token.changed().await.is_err() {
                debug!("session store dropped, screen no longer reloads");
                break;
            }
        }
    })
}
