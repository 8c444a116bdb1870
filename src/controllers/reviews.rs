use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::api::WalkerApi;
use crate::controllers::Screen;
use crate::error::UNAUTHENTICATED_MESSAGE;
use crate::models::{Review, sort_newest_first};
use crate::session::SessionStore;
use crate::state::{ScreenState, StateStream};

pub struct ReviewsController {
    api: Arc<dyn WalkerApi>,
    session: Arc<SessionStore>,
    reviews: StateStream<Vec<Review>>,
    detail: StateStream<Review>,
}

impl ReviewsController {
    pub fn new(api: Arc<dyn WalkerApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            reviews: StateStream::new(),
            detail: StateStream::new(),
        }
    }

    pub fn reviews(&self) -> &StateStream<Vec<Review>> {
        &self.reviews
    }

    pub fn detail(&self) -> &StateStream<Review> {
        &self.detail
    }

    /// Loads the walker's reviews, newest first.
    pub async fn load_reviews(&self) {
        let Some(token) = self.session.token() else {
            self.reviews
                .set(ScreenState::Error(UNAUTHENTICATED_MESSAGE.to_string()));
            return;
        };
        self.reviews.set(ScreenState::Loading);

        let state = match self.api.get_reviews(&token).await {
            Ok(mut reviews) => {
                sort_newest_first(&mut reviews);
                ScreenState::Success(reviews)
            }
            Err(e) if e.is_decode() => {
                warn!("ignoring malformed reviews response: {}", e);
                ScreenState::Success(Vec::new())
            }
            Err(e) => {
                warn!("failed to load reviews: {}", e);
                ScreenState::Error(e.stream_message("reviews"))
            }
        };
        self.reviews.set(state);
    }

    pub async fn open_review(&self, id: i64) {
        let Some(token) = self.session.token() else {
            self.detail
                .set(ScreenState::Error(UNAUTHENTICATED_MESSAGE.to_string()));
            return;
        };
        self.detail.set(ScreenState::Loading);

        match self.api.get_review(&token, id).await {
            Ok(review) => self.detail.set(ScreenState::Success(review)),
            Err(e) => {
                warn!("failed to load review {}: {}", id, e);
                self.detail.set(ScreenState::Error(e.stream_message("review")));
            }
        }
    }
}

#[async_trait]
impl Screen for ReviewsController {
    async fn load(&self) {
        self.load_reviews().await;
    }
}
