//! Object storage for article thumbnails
//!
//! Uploads thumbnail bytes and resolves the public download URL that is
//! written into the article form. Firebase Storage is the default backend;
//! any S3-compatible bucket works as well.

pub mod firebase;
pub mod mock;
pub mod s3;

pub use firebase::FirebaseStorageClient;
pub use mock::MockStorageClient;
pub use s3::S3StorageClient;

use crate::models::StoredObject;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str)
        -> Result<StoredObject>;
    async fn download_url(&self, object: &StoredObject) -> Result<String>;
}
