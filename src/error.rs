use thiserror::Error;

pub const UNAUTHENTICATED_MESSAGE: &str = "unauthenticated";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}")]
    Http { status: u16 },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to read photo: {0}")]
    Photo(String),
}

impl ApiError {
    /// Text shown to the walker for a failed fetch stream. `context` is the
    /// stream label used in the status-code variant ("pendientes", "reviews").
    pub fn stream_message(&self, context: &str) -> String {
        match self {
            ApiError::Http { status } => format!("Error {}: {}", context, status),
            ApiError::Network(_) => format!("Error de red ({})", context),
            ApiError::Decode(_) => format!("Error {}: respuesta inválida", context),
            ApiError::Photo(_) => "Error de carga".to_string(),
        }
    }

    /// Text shown for a failed one-shot action. `failure` is the prefix used
    /// when the server answered with a non-2xx status.
    pub fn action_message(&self, failure: &str) -> String {
        match self {
            ApiError::Http { status } => format!("{}: {}", failure, status),
            ApiError::Network(_) => "Error de red".to_string(),
            ApiError::Decode(_) => format!("{}: respuesta inválida", failure),
            ApiError::Photo(_) => "Error de carga".to_string(),
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base url: {0}")]
    InvalidBaseUrl(String),
}
