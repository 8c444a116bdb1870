use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{PhotoUpload, WalkerApi};
use crate::controllers::{ActionGuard, ActionOutcome, Screen};
use crate::error::{SessionError, UNAUTHENTICATED_MESSAGE};
use crate::models::UserInfo;
use crate::session::SessionStore;
use crate::state::{ScreenState, StateStream};

pub const PHOTO_UPLOADED: &str = "Foto subida correctamente";
pub const PHOTO_UPLOAD_FAILED: &str = "Error al subir foto";

/// Profile header, availability switch and logout.
pub struct HomeController {
    api: Arc<dyn WalkerApi>,
    session: Arc<SessionStore>,
    availability: watch::Sender<bool>,
    user_info: StateStream<UserInfo>,
    upload_in_progress: AtomicBool,
}

impl HomeController {
    pub fn new(api: Arc<dyn WalkerApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            availability: watch::channel(false).0,
            user_info: StateStream::new(),
            upload_in_progress: AtomicBool::new(false),
        }
    }

    pub fn availability(&self) -> watch::Receiver<bool> {
        self.availability.subscribe()
    }

    pub fn user_info(&self) -> &StateStream<UserInfo> {
        &self.user_info
    }

    /// Failures put back whatever was shown before.
    pub async fn load_user_info(&self) {
        let Some(token) = self.session.token() else {
            self.user_info
                .set(ScreenState::Error(UNAUTHENTICATED_MESSAGE.to_string()));
            return;
        };
        let previous = self.user_info.current();
        let loaded = previous.data().is_some();
        if !loaded {
            self.user_info.set(ScreenState::Loading);
        }

        match self.api.get_me(&token).await {
            Ok(info) => self.user_info.set(ScreenState::Success(info)),
            Err(e) => {
                warn!("failed to load profile: {}", e);
                if !loaded {
                    self.user_info.set(previous);
                }
            }
        }
    }

    /// The switch only moves once the service confirms the change.
    pub async fn toggle_availability(&self, is_available: bool) {
        let Some(token) = self.session.token() else {
            warn!("availability change without session");
            return;
        };
        match self.api.set_availability(&token, is_available).await {
            Ok(()) => {
                info!("availability set to {}", is_available);
                self.availability.send_replace(is_available);
            }
            Err(e) => warn!("failed to change availability: {}", e),
        }
    }

    pub async fn upload_profile_photo(&self, path: &Path) -> ActionOutcome {
        let Some(_guard) = ActionGuard::acquire(&self.upload_in_progress) else {
            return ActionOutcome::Busy;
        };
        let Some(token) = self.session.token() else {
            return ActionOutcome::Failed(UNAUTHENTICATED_MESSAGE.to_string());
        };

        let photo = match PhotoUpload::from_path(path).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!("{}", e);
                return ActionOutcome::Failed(e.action_message(PHOTO_UPLOAD_FAILED));
            }
        };

        match self.api.upload_walker_photo(&token, photo).await {
            Ok(()) => {
                info!("profile photo uploaded");
                ActionOutcome::Completed(PHOTO_UPLOADED.to_string())
            }
            Err(e) => {
                warn!("profile photo upload failed: {}", e);
                ActionOutcome::Failed(e.action_message(PHOTO_UPLOAD_FAILED))
            }
        }
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session.clear().await?;
        self.user_info.set(ScreenState::Idle);
        self.availability.send_replace(false);
        Ok(())
    }
}

#[async_trait]
impl Screen for HomeController {
    async fn load(&self) {
        self.load_user_info().await;
    }
}
