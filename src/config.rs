use std::env;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://apimascotas.jmacboy.com/api/";
pub const DEFAULT_SESSION_DB: &str = "sqlite://walker_session.db";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Always ends with `/` so endpoint paths can be appended directly.
    pub base_url: String,
    pub session_db_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str, session_db_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            session_db_url: session_db_url.to_string(),
        })
    }

    pub fn new_from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("WALKER_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let session_db_url =
            env::var("WALKER_SESSION_DB").unwrap_or_else(|_| DEFAULT_SESSION_DB.to_string());

        Self::new(&base_url, &session_db_url)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/", trimmed))
    }
}
