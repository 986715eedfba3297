use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::ImageHost;
use crate::error::AppError;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Credentials for a Cloudinary account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Client for Cloudinary's signed upload API.
#[derive(Debug, Clone)]
pub struct Cloudinary {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl Cloudinary {
    pub fn new(credentials: CloudinaryCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", API_BASE, self.credentials.cloud_name)
    }
}

/// Sign request parameters: hex SHA-1 of the `key=value` pairs sorted by key and joined
/// with `&`, immediately followed by the API secret.
pub(crate) fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut payload = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    payload.push_str(api_secret);

    sha1_smol::Sha1::from(payload).digest().to_string()
}

#[async_trait]
impl ImageHost for Cloudinary {
    async fn upload(&self, path: &Path) -> Result<String, AppError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_owned());

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(&[("timestamp", timestamp.as_str())], &self.credentials.api_secret);

        let form = Form::new()
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(AppError::ImageHost(message));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.secure_url)
    }
}
