use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Stores an uploaded bitmap and hands back a durable public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, png: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Unsigned uploads to a Cloudinary account.
pub struct CloudinaryHost {
    client: reqwest::Client,
    endpoint: String,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        let cloud_name = cloud_name.into();
        let endpoint = Self::endpoint_for(&cloud_name);
        Self::with_endpoint(endpoint, cloud_name, upload_preset)
    }

    /// Point at a different upload URL, e.g. a local mock.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        cloud_name: impl Into<String>,
        upload_preset: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
        }
    }

    pub fn endpoint_for(cloud_name: &str) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/upload", cloud_name)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, png: Vec<u8>) -> Result<String> {
        let size = png.len();
        let file = Part::bytes(png)
            .file_name("qr-code.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("cloud_name", self.cloud_name.clone());

        log::debug!("Uploading {} bytes to {}", size, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Error uploading to Cloudinary: {}", e);
                Error::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Error uploading to Cloudinary: HTTP {}", status);
            return Err(Error::Upstream(format!(
                "Failed to upload to Cloudinary (HTTP {})",
                status.as_u16()
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            log::error!("Error uploading to Cloudinary: {}", e);
            Error::from(e)
        })?;

        let url = body
            .secure_url
            .ok_or_else(|| Error::Upstream("upload response has no secure_url".to_string()))?;
        log::info!("Uploaded QR image to {}", url);
        Ok(url)
    }
}
