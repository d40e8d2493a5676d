//! Dashboard bootstrap: configuration, CMS client and storage initialisation.

use crate::actions::{DashboardActions, DeletionOutcome};
use crate::cms::{CmsClient, CmsService};
use crate::models::{
    ArticleForm, ArticleTarget, CategoryTarget, Config, StorageBackend, THUMBNAIL_CLEAR_FIELD,
};
use crate::prompt::Prompt;
use crate::storage::{FirebaseStorageClient, MockStorageClient, S3StorageClient, StorageService};
use crate::thumbnail::Thumbnail;
use crate::uploader::{SubmitOutcome, Uploader};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dashboard actions and the uploader, sharing one CMS client.
pub struct App {
    actions: DashboardActions,
    uploader: Uploader,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub cms: Arc<dyn CmsService>,
    pub storage: Arc<dyn StorageService>,
    pub prompt: Arc<dyn Prompt>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: &Config) -> Self {
        let actions = DashboardActions::new(services.cms.clone(), services.prompt.clone())
            .with_reload_policies(config.article_reload, config.category_reload);
        let uploader = Uploader::new(services.storage, services.cms, services.prompt)
            .with_max_thumbnail_bytes(config.max_thumbnail_bytes);

        debug!(
            "Clear-thumbnail control '{}' suppressed on article forms",
            THUMBNAIL_CLEAR_FIELD
        );

        Self { actions, uploader }
    }

    /// Construct an app from configuration, signing in first when
    /// `CMS_EMAIL` and `CMS_PASSWORD` are set.
    pub async fn from_config(config: &Config, prompt: Arc<dyn Prompt>) -> Result<Self> {
        let cms = CmsClient::from_config(config)?;
        info!("CMS endpoint: {}", config.cms_base_url);

        match config.credentials()? {
            Some((email, password)) => cms.login(email, password.expose()).await?,
            None if config.session_id.is_none() => {
                warn!("No CMS credentials or session configured; requests will be anonymous")
            }
            None => debug!("Using the configured CMS session cookie"),
        }

        let storage = Self::init_storage(config, &cms).await?;

        Ok(Self::with_services(
            AppServices {
                cms: Arc::new(cms),
                storage,
                prompt,
            },
            config,
        ))
    }

    async fn init_storage(config: &Config, cms: &CmsClient) -> Result<Arc<dyn StorageService>> {
        if config.dry_run {
            info!("DRY_RUN enabled, thumbnail uploads will be skipped");
            return Ok(Arc::new(MockStorageClient::new()));
        }

        match config.storage_backend {
            StorageBackend::Firebase => {
                let firebase_config = cms.fetch_storage_config().await?;
                info!(
                    "Storage provider: Firebase (bucket: {})",
                    firebase_config.storage_bucket
                );
                let client =
                    FirebaseStorageClient::from_config(&firebase_config, config.request_timeout)?
                        .with_base_url(config.firebase_storage_url.clone())
                        .with_auth_token(config.firebase_auth_token.clone());
                Ok(Arc::new(client))
            }
            StorageBackend::S3 => {
                let settings = config.s3.clone().ok_or_else(|| {
                    Error::Config("S3 storage selected but CDN_* settings are missing".to_string())
                })?;
                info!("Storage provider: S3 (bucket: {})", settings.bucket);
                Ok(Arc::new(S3StorageClient::new(settings).await?))
            }
        }
    }

    pub async fn delete_article(&self, target: &ArticleTarget) -> Result<DeletionOutcome> {
        self.actions.delete_article(target).await
    }

    pub async fn delete_category(&self, target: &CategoryTarget) -> Result<DeletionOutcome> {
        self.actions.delete_category(target).await
    }

    pub async fn submit_article(
        &self,
        form: ArticleForm,
        thumbnail: Option<Thumbnail>,
    ) -> Result<SubmitOutcome> {
        self.uploader.submit(form, thumbnail).await
    }
}
