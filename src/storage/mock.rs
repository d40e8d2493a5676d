use super::StorageService;
use crate::models::StoredObject;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorageClient {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<StoredObject> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Storage("Mock upload failure".to_string()));
        }

        *self.upload_count.lock().unwrap() += 1;
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());

        Ok(StoredObject {
            key: key.to_string(),
            bucket: "mock-bucket".to_string(),
            download_token: Some("mock-token".to_string()),
        })
    }

    async fn download_url(&self, object: &StoredObject) -> Result<String> {
        if !self.files.lock().unwrap().contains_key(&object.key) {
            return Err(Error::Storage(format!("File not found: {}", object.key)));
        }
        Ok(format!("{}/{}", self.base_url, object.key))
    }
}
