pub mod dto;

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{Review, UserInfo, Walk};

/// Media type sent with every photo part; the service accepts any image.
pub const PHOTO_MEDIA_TYPE: &str = "image/*";
/// Multipart field name the service reads the file from.
pub const PHOTO_FIELD: &str = "photo";

/// A photo read into memory, ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Photo(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());

        Ok(Self { file_name, bytes })
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(PHOTO_MEDIA_TYPE)
            .map_err(|e| ApiError::Photo(e.to_string()))?;
        Ok(Form::new().part(PHOTO_FIELD, part))
    }
}

#[async_trait]
pub trait WalkerApi: Send + Sync {
    /// Returns the bearer token issued for the credentials.
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;
    async fn register(&self, request: &dto::RegisterRequest) -> Result<(), ApiError>;
    async fn set_availability(&self, token: &str, is_available: bool) -> Result<(), ApiError>;
    async fn upload_walker_photo(&self, token: &str, photo: PhotoUpload) -> Result<(), ApiError>;

    async fn get_pending_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError>;
    async fn get_accepted_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError>;
    async fn get_all_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError>;

    async fn accept_walk(&self, token: &str, id: i64) -> Result<(), ApiError>;
    async fn reject_walk(&self, token: &str, id: i64) -> Result<(), ApiError>;
    async fn start_walk(&self, token: &str, id: i64) -> Result<(), ApiError>;
    async fn end_walk(&self, token: &str, id: i64) -> Result<(), ApiError>;

    async fn get_walk_photos(&self, token: &str, id: i64) -> Result<Vec<String>, ApiError>;
    async fn upload_walk_photo(
        &self,
        token: &str,
        id: i64,
        photo: PhotoUpload,
    ) -> Result<(), ApiError>;

    async fn get_me(&self, token: &str) -> Result<UserInfo, ApiError>;
    async fn get_reviews(&self, token: &str) -> Result<Vec<Review>, ApiError>;
    async fn get_review(&self, token: &str, id: i64) -> Result<Review, ApiError>;
}

pub struct WalkerHttpClient {
    client: Client,
    base_url: String,
}

impl WalkerHttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} {}", status, response.url().path());
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_body(response: Response) -> Result<String, ApiError> {
        response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = Self::read_body(self.send(request).await?).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    /// Lists tolerate an empty body, which the service sends instead of `[]`
    /// on some endpoints.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, ApiError> {
        let body = Self::read_body(self.send(request).await?).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse list response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl WalkerApi for WalkerHttpClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let request = self
            .client
            .post(self.url("auth/walkerlogin"))
            .json(&dto::LoginRequest { email, password });

        let response: dto::LoginResponse = self.fetch_json(request).await?;
        Ok(response.token)
    }

    async fn register(&self, request: &dto::RegisterRequest) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("auth/walkerregister"))
            .json(request);
        self.execute(request).await
    }

    async fn set_availability(&self, token: &str, is_available: bool) -> Result<(), ApiError> {
        let request = self
            .post("walkers/availability", token)
            .json(&dto::AvailabilityRequest { is_available });
        self.execute(request).await
    }

    async fn upload_walker_photo(&self, token: &str, photo: PhotoUpload) -> Result<(), ApiError> {
        let form = photo.into_form()?;
        self.execute(self.post("walkers/photo", token).multipart(form))
            .await
    }

    async fn get_pending_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.fetch_list(self.get("walks/pending", token)).await
    }

    async fn get_accepted_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.fetch_list(self.get("walks/accepted", token)).await
    }

    async fn get_all_walks(&self, token: &str) -> Result<Vec<Walk>, ApiError> {
        self.fetch_list(self.get("walks", token)).await
    }

    async fn accept_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.execute(self.post(&format!("walks/{}/accept", id), token))
            .await
    }

    async fn reject_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.execute(self.post(&format!("walks/{}/reject", id), token))
            .await
    }

    async fn start_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.execute(self.post(&format!("walks/{}/start", id), token))
            .await
    }

    async fn end_walk(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.execute(self.post(&format!("walks/{}/end", id), token))
            .await
    }

    async fn get_walk_photos(&self, token: &str, id: i64) -> Result<Vec<String>, ApiError> {
        self.fetch_list(self.get(&format!("walks/{}/photos", id), token))
            .await
    }

    async fn upload_walk_photo(
        &self,
        token: &str,
        id: i64,
        photo: PhotoUpload,
    ) -> Result<(), ApiError> {
        let form = photo.into_form()?;
        self.execute(self.post(&format!("walks/{}/photo", id), token).multipart(form))
            .await
    }

    async fn get_me(&self, token: &str) -> Result<UserInfo, ApiError> {
        self.fetch_json(self.get("me", token)).await
    }

    async fn get_reviews(&self, token: &str) -> Result<Vec<Review>, ApiError> {
        self.fetch_list(self.get("reviews", token)).await
    }

    async fn get_review(&self, token: &str, id: i64) -> Result<Review, ApiError> {
        self.fetch_json(self.get(&format!("reviews/{}", id), token))
            .await
    }
}
