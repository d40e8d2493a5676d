use super::StorageService;
use crate::models::{FirebaseConfig, StoredObject};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://firebasestorage.googleapis.com";

/// Object metadata returned by the Firebase Storage REST API.
#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    name: String,
    bucket: String,
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

/// Firebase Storage REST client bound to one bucket.
pub struct FirebaseStorageClient {
    client: Client,
    bucket: String,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseStorageClient {
    pub fn new(bucket: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new_with_client(bucket, client))
    }

    pub fn new_with_client(bucket: String, client: Client) -> Self {
        Self {
            client,
            bucket,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
        }
    }

    /// Initialises a client from the SDK configuration served by the CMS.
    pub fn from_config(config: &FirebaseConfig, timeout: Duration) -> Result<Self> {
        Self::new(config.storage_bucket.clone(), timeout)
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Firebase ID token sent as `Authorization: Firebase <token>`.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Invalid storage URL '{}': {}", self.base_url, e))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("Storage URL cannot be a base: {}", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["v0", "b", self.bucket.as_str(), "o"]);
            if let Some(key) = key {
                // A single segment, so `/` in the key is escaped as %2F
                segments.push(key);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("Firebase {}", token)),
            None => request,
        }
    }

    async fn parse_metadata(response: Response, action: &str) -> Result<ObjectMetadata> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Firebase Storage {} failed (status {}): {}", action, status, error_text);
            return Err(Error::Storage(format!(
                "Firebase Storage {} failed (status {}): {}",
                action, status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Firebase Storage response: {}\nBody: {}", e, body);
            Error::Storage(format!("Failed to parse Firebase Storage response: {}", e))
        })
    }
}

#[async_trait]
impl StorageService for FirebaseStorageClient {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        let url = self.object_url(None)?;
        tracing::debug!("Uploading {} bytes to {}/{}", data.len(), self.bucket, key);

        let request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(CONTENT_TYPE, content_type)
            .body(data.to_vec());

        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::error!("Failed to send upload to Firebase Storage: {}", e);
            e
        })?;
        let metadata = Self::parse_metadata(response, "upload").await?;

        Ok(StoredObject {
            key: metadata.name,
            bucket: metadata.bucket,
            download_token: metadata.download_tokens,
        })
    }

    async fn download_url(&self, object: &StoredObject) -> Result<String> {
        let metadata_url = self.object_url(Some(&object.key))?;
        let response = self
            .authorize(self.client.get(metadata_url))
            .send()
            .await?;
        let metadata = Self::parse_metadata(response, "metadata lookup").await?;

        let tokens = metadata
            .download_tokens
            .or_else(|| object.download_token.clone())
            .ok_or_else(|| {
                Error::Storage(format!("No download token issued for {}", object.key))
            })?;
        let token = tokens
            .split(',')
            .map(str::trim)
            .find(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Storage(format!("No download token issued for {}", object.key))
            })?;

        let mut url = self.object_url(Some(&object.key))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);

        tracing::debug!("Resolved download URL {}", url);
        Ok(url.to_string())
    }
}
