use std::sync::Arc;

use tokio::sync::watch;

/// Result of one fetch stream as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> ScreenState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ScreenState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScreenState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Observable current value of a [`ScreenState`]. Subscribers see the latest
/// state immediately and every later transition.
pub struct StateStream<T> {
    tx: Arc<watch::Sender<ScreenState<T>>>,
}

impl<T> Clone for StateStream<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Default for StateStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> StateStream<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ScreenState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenState<T>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ScreenState<T> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, state: ScreenState<T>) {
        self.tx.send_replace(state);
    }

    pub fn modify(&self, f: impl FnOnce(&mut ScreenState<T>)) {
        self.tx.send_modify(f);
    }

    /// Moves to `Loading` unless a cycle is already running or has reached a
    /// terminal `Success`. Returns whether the caller owns the new cycle.
    pub fn try_begin(&self) -> bool {
        self.tx.send_if_modified(|state| match state {
            ScreenState::Loading | ScreenState::Success(_) => false,
            _ => {
                *state = ScreenState::Loading;
                true
            }
        })
    }
}
