use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::api::{WalkerApi, dto};
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::state::{ScreenState, StateStream};

/// Idle, Loading, Success or Error(message). Success carries no data.
pub type AuthState = ScreenState<()>;

pub const INVALID_CREDENTIALS: &str = "Email o contraseña incorrectos.";
pub const NETWORK_RETRY: &str = "Error de red. Inténtalo de nuevo.";
pub const REGISTER_FAILED: &str = "Error en el registro. Inténtalo de nuevo.";
const SESSION_NOT_SAVED: &str = "No se pudo guardar la sesión.";

pub struct LoginController {
    api: Arc<dyn WalkerApi>,
    session: Arc<SessionStore>,
    state: StateStream<()>,
    navigate: AtomicBool,
}

impl LoginController {
    pub fn new(api: Arc<dyn WalkerApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            state: StateStream::new(),
            navigate: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> &StateStream<()> {
        &self.state
    }

    /// Submits the credentials. Ignored while a submission is in flight or
    /// once login has succeeded.
    pub async fn login(&self, email: &str, password: &str) {
        if !self.state.try_begin() {
            debug!("login already in progress or completed");
            return;
        }

        let token = match self.api.login(email, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!("login failed: {}", e);
                self.state.set(ScreenState::Error(login_message(&e)));
                return;
            }
        };

        // The token must be persisted before Success is observable.
        if let Err(e) = self.session.save_token(&token).await {
            error!("failed to persist session: {}", e);
            self.state.set(ScreenState::Error(SESSION_NOT_SAVED.to_string()));
            return;
        }

        info!("walker logged in");
        self.navigate.store(true, Ordering::Release);
        self.state.set(ScreenState::Success(()));
    }

    /// True exactly once after a successful login.
    pub fn take_navigation(&self) -> bool {
        self.navigate.swap(false, Ordering::AcqRel)
    }
}

fn login_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => NETWORK_RETRY.to_string(),
        _ => INVALID_CREDENTIALS.to_string(),
    }
}

pub struct RegisterController {
    api: Arc<dyn WalkerApi>,
    state: StateStream<()>,
}

impl RegisterController {
    pub fn new(api: Arc<dyn WalkerApi>) -> Self {
        Self {
            api,
            state: StateStream::new(),
        }
    }

    pub fn state(&self) -> &StateStream<()> {
        &self.state
    }

    pub async fn register(&self, name: &str, email: &str, password: &str, price_hour: &str) {
        if !self.state.try_begin() {
            debug!("registration already in progress or completed");
            return;
        }

        let request = dto::RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            price_hour: price_hour.to_string(),
        };

        match self.api.register(&request).await {
            Ok(()) => {
                info!("walker registered");
                self.state.set(ScreenState::Success(()));
            }
            Err(ApiError::Network(e)) => {
                warn!("registration network failure: {}", e);
                self.state.set(ScreenState::Error(NETWORK_RETRY.to_string()));
            }
            Err(e) => {
                warn!("registration rejected: {}", e);
                self.state.set(ScreenState::Error(REGISTER_FAILED.to_string()));
            }
        }
    }
}
