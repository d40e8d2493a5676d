use super::StorageService;
use crate::models::{S3Settings, StoredObject};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};
use reqwest::Url;

pub struct S3StorageClient {
    client: S3Client,
    bucket: String,
    base_url: Url,
}

impl S3StorageClient {
    pub async fn new(settings: S3Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            Error::Config(format!("Invalid S3_BASE_URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "S3_BASE_URL cannot be a base: {}",
                settings.base_url
            )));
        }

        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "blog-dashboard",
        );

        // S3-compatible providers ignore the region but the SDK requires one
        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .endpoint_url(settings.endpoint)
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket: settings.bucket,
            base_url,
        })
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload {}: {}", key, e)))?;

        Ok(StoredObject {
            key: key.to_string(),
            bucket: self.bucket.clone(),
            download_token: None,
        })
    }

    async fn download_url(&self, object: &StoredObject) -> Result<String> {
        public_url(&self.base_url, &object.key)
    }
}

/// Appends `key` to `base`, percent-encoding each `/`-separated segment.
fn public_url(base: &Url, key: &str) -> Result<String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("S3_BASE_URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(key.split('/'));
    Ok(url.to_string())
}
