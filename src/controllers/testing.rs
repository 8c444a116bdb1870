use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{PhotoUpload, WalkerApi, dto};
use crate::error::ApiError;
use crate::models::{Review, UserInfo, Walk};
use crate::session::SessionStore;

#[derive(Clone, Copy, Debug)]
pub(crate) enum Failure {
    Status(u16),
    Network,
    Decode,
    Panic,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(status) => ApiError::Http { status },
            Failure::Network => ApiError::Network("connection reset".to_string()),
            Failure::Decode => ApiError::Decode("expected value".to_string()),
            Failure::Panic => panic!("fake endpoint blew up"),
        }
    }
}

/// In-memory walker service. Mutations move walks between lists the way the
/// real service does, and every call is recorded with the token it carried.
#[derive(Default)]
pub(crate) struct FakeApi {
    pub pending: Mutex<Vec<Walk>>,
    pub accepted: Mutex<Vec<Walk>>,
    pub all: Mutex<Vec<Walk>>,
    pub reviews: Mutex<Vec<Review>>,
    pub photos: Mutex<Vec<String>>,
    pub me: Mutex<UserInfo>,
    pub token: Mutex<String>,
    pub calls: Mutex<Vec<String>>,
    pub tokens_seen: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    hold: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeApi {
    pub fn fail(&self, endpoint: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(endpoint, failure);
    }

    /// Makes `endpoint` park after recording the call until the returned
    /// notify is signalled.
    pub fn hold(&self, endpoint: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.hold.lock().unwrap().insert(endpoint, Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|call| *call == endpoint).count()
    }

    async fn enter(&self, endpoint: &'static str, token: Option<&str>) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        if let Some(token) = token {
            self.tokens_seen.lock().unwrap().push(token.to_string());
        }
        let held = self.hold.lock().unwrap().get(endpoint).cloned();
        if let Some(notify) = held {
            notify.notified().await;
        }
        let failure = self.failures.lock().unwrap().get(endpoint).copied();
        match failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

pub(crate) fn walk(id: i64, status: &str) -> Walk {
    Walk {
        id,
        pet_id: Some(id * 10),
        walker_id: None,
        scheduled_at: Some("2024-05-01T09:00:00Z".to_string()),
        duration_minutes: Some(30),
        notes: None,
        status: Some(status.to_string()),
    }
}

pub(crate) async fn session_with_token(token: Option<&str>) -> Arc<SessionStore> {
    let session = SessionStore::open("sqlite::memory:").await.unwrap();
    if let Some(token) = token {
        session.save_token(token).await.unwrap();
    }
    Arc::new(session)
}

#[async_trait]
impl WalkerApi for FakeApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<String, ApiError> {
        self.enter("login", None).await?;
        Ok(self.token.lock().unwrap().clone())
    }

    async fn register(&self, _request: &dto::RegisterRequest) -> Result<(), ApiError> {
        self.enter("register", None).await
    }

    async fn set_availability(&self, token: &str, _is_available: bool) -> Result<(), ApiError> {
        self.enter("availability", Some(token)).await
    }

    async fn upload_walker_photo(&self, token: &str, _photo: PhotoUpload) -> Result<(), ApiError> {
        self.enter("walker_photo", Some(token)).await
    }

    async fn get_pending_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.enter("pending", Some(token)).await?;
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn get_accepted_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.enter("accepted", Some(token)).await?;
        Ok(self.accepted.lock().unwrap().clone())
    }

    async fn get_all_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.enter("all", Some(token)).await?;
        Ok(self.all.lock().unwrap().clone())
    }

    async fn accept_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.enter("accept", Some(token)).await?;
        let mut pending = self.pending.lock().unwrap();
        if let Some(pos) = pending.iter().position(|w| w.id == id) {
            let mut walk = pending.remove(pos);
            walk.status = Some("accepted".to_string());
            self.accepted.lock().unwrap().push(walk);
        }
        Ok(())
    }

    async fn reject_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.enter("reject", Some(token)).await?;
        self.pending.lock().unwrap().retain(|w| w.id != id);
        Ok(())
    }

    async fn start_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.enter("start", Some(token)).await?;
        for walk in self.accepted.lock().unwrap().iter_mut().filter(|w| w.id == id) {
            walk.status = Some("in_progress".to_string());
        }
        Ok(())
    }

    async fn end_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.enter("end", Some(token)).await?;
        let mut accepted = self.accepted.lock().unwrap();
        if let Some(pos) = accepted.iter().position(|w| w.id == id) {
            let mut walk = accepted.remove(pos);
            walk.status = Some("ended".to_string());
            self.all.lock().unwrap().push(walk);
        }
        Ok(())
    }

    async fn get_walk_photos(&self, token: &str, _id: i64) -> Result<Vec<String>, ApiError> {
        self.enter("photos", Some(token)).await?;
        Ok(self.photos.lock().unwrap().clone())
    }

    async fn upload_walk_photo(
        &self,
        token: &str,
        id: i64,
        photo: PhotoUpload,
    ) -> Result<(), ApiError> {
        self.enter("walk_photo", Some(token)).await?;
        self.photos
            .lock()
            .unwrap()
            .push(format!("https://cdn.test/walks/{}/{}", id, photo.file_name));
        Ok(())
    }

    async fn get_me(&self, token: &str) -> Result<UserInfo, ApiError> {
        self.enter("me", Some(token)).await?;
        Ok(self.me.lock().unwrap().clone())
    }

    async fn get_reviews(&self, token: &str) -> Result<Vec<Review>, ApiError> {
        self.enter("reviews", Some(token)).await?;
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn get_review(&self, token: &str, id: i64) -> Result<Review, ApiError> {
        self.enter("review", Some(token)).await?;
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(ApiError::Http { status: 404 })
    }
}
