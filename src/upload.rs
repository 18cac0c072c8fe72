//! Screenshot hosting.
//!
//! Issues only keep a URL for their screenshot; the bytes go to an external
//! image host. [`ImgbbClient`] talks to ImgBB, tests swap in their own
//! [`ImageHost`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

pub const DEFAULT_IMGBB_URL: &str = "https://api.imgbb.com/1/upload";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("ImgBB API key is not configured.")]
    NotConfigured,

    #[error("Failed to upload image to ImgBB: {0}")]
    Rejected(String),

    #[error("ImgBB returned an error: {0}")]
    Unsuccessful(String),

    #[error("Failed to process screenshot: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store the image and return its public URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

pub struct ImgbbClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl ImgbbClient {
    pub fn new(api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbImage>,
    error: Option<ImgbbFailure>,
}

#[derive(Debug, Deserialize)]
struct ImgbbImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImgbbFailure {
    message: Option<String>,
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let key = self.api_key.as_deref().ok_or(UploadError::NotConfigured)?;

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", key)])
            .multipart(Form::new().part("image", part))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected(body));
        }

        let body: ImgbbResponse = response.json().await?;
        if !body.success {
            let message = body.error.and_then(|e| e.message).unwrap_or_default();
            return Err(UploadError::Unsuccessful(message));
        }

        let url = body
            .data
            .map(|image| image.url)
            .ok_or_else(|| UploadError::Unsuccessful("response carried no image URL".into()))?;
        tracing::debug!(filename, url = %url, "screenshot uploaded");
        Ok(url)
    }
}
