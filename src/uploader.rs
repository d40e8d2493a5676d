//! Thumbnail upload followed by article form submission.

use crate::cms::CmsService;
use crate::models::{ArticleForm, DEFAULT_MAX_THUMBNAIL_BYTES};
use crate::prompt::Prompt;
use crate::storage::StorageService;
use crate::thumbnail::{storage_key, Thumbnail};
use crate::Result;
use chrono::{DateTime, FixedOffset, Local};
use std::sync::Arc;
use tracing::{debug, info};

pub const THUMBNAIL_TOO_LARGE: &str = "File cannot be greater than 1Mb";

pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { thumbnail_url: Option<String> },
    /// The thumbnail was over the size limit; the form was not sent.
    Rejected { size: u64 },
}

pub struct Uploader {
    storage: Arc<dyn StorageService>,
    cms: Arc<dyn CmsService>,
    prompt: Arc<dyn Prompt>,
    max_thumbnail_bytes: u64,
    clock: Clock,
}

impl Uploader {
    pub fn new(
        storage: Arc<dyn StorageService>,
        cms: Arc<dyn CmsService>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            storage,
            cms,
            prompt,
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            clock: Arc::new(|| Local::now().fixed_offset()),
        }
    }

    pub fn with_max_thumbnail_bytes(mut self, max: u64) -> Self {
        self.max_thumbnail_bytes = max;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn submit(
        &self,
        mut form: ArticleForm,
        thumbnail: Option<Thumbnail>,
    ) -> Result<SubmitOutcome> {
        let Some(thumbnail) = thumbnail else {
            debug!("No thumbnail selected, submitting form as-is");
            self.cms.submit_article(&form).await?;
            return Ok(SubmitOutcome::Submitted {
                thumbnail_url: None,
            });
        };

        let size = thumbnail.size();
        if size > self.max_thumbnail_bytes {
            info!(
                "Rejected thumbnail {} ({} bytes, limit {})",
                thumbnail.file_name, size, self.max_thumbnail_bytes
            );
            self.prompt.alert(THUMBNAIL_TOO_LARGE).await?;
            return Ok(SubmitOutcome::Rejected { size });
        }

        let key = storage_key(&(self.clock)(), &thumbnail.file_name);
        let object = self
            .storage
            .upload_file(&key, &thumbnail.data, thumbnail.content_type())
            .await?;
        let url = self.storage.download_url(&object).await?;
        info!("Uploaded thumbnail to {}", url);

        form.thumbnail = Some(url.clone());
        let location = self.cms.submit_article(&form).await?;
        debug!("Article form accepted, redirected to {}", location);

        Ok(SubmitOutcome::Submitted {
            thumbnail_url: Some(url),
        })
    }
}
