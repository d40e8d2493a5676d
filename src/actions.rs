//! Confirmed deletion of articles and categories from the dashboard.

use crate::cms::CmsService;
use crate::models::{ArticleTarget, CategoryTarget, DashboardSection, ReloadPolicy};
use crate::prompt::Prompt;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The user declined; nothing was requested.
    Cancelled,
    Deleted { reloaded: bool },
}

pub struct DashboardActions {
    cms: Arc<dyn CmsService>,
    prompt: Arc<dyn Prompt>,
    article_reload: ReloadPolicy,
    category_reload: ReloadPolicy,
}

impl DashboardActions {
    pub fn new(cms: Arc<dyn CmsService>, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            cms,
            prompt,
            article_reload: ReloadPolicy::OnSuccess,
            category_reload: ReloadPolicy::Never,
        }
    }

    pub fn with_reload_policies(mut self, article: ReloadPolicy, category: ReloadPolicy) -> Self {
        self.article_reload = article;
        self.category_reload = category;
        self
    }

    /// Asks before deleting the article. Repeated calls issue repeated
    /// requests.
    pub async fn delete_article(&self, target: &ArticleTarget) -> Result<DeletionOutcome> {
        let message = format!("Do you want to delete this article?\n\n{}", target.topic);
        if !self.prompt.confirm(&message).await? {
            debug!("Article deletion declined: {}", target.slug);
            return Ok(DeletionOutcome::Cancelled);
        }

        debug!("/article/delete/{}/", target.slug);
        let result = self.cms.delete_article(&target.slug).await;
        self.finish(result, self.article_reload, DashboardSection::Articles)
            .await
    }

    /// Asks before deleting the category. Repeated calls issue repeated
    /// requests.
    pub async fn delete_category(&self, target: &CategoryTarget) -> Result<DeletionOutcome> {
        let message = format!("Do you want to delete this category?\n\n{}", target.name);
        if !self.prompt.confirm(&message).await? {
            debug!("Category deletion declined: {}", target.pk);
            return Ok(DeletionOutcome::Cancelled);
        }

        debug!("/categories/delete/{}/", target.pk);
        let result = self.cms.delete_category(&target.pk).await;
        self.finish(result, self.category_reload, DashboardSection::Categories)
            .await
    }

    async fn finish(
        &self,
        result: Result<()>,
        policy: ReloadPolicy,
        section: DashboardSection,
    ) -> Result<DeletionOutcome> {
        let reloaded = policy.should_reload(result.is_ok());
        if reloaded {
            let reload = self.cms.reload_dashboard(section).await;
            if let Err(e) = reload {
                // The deletion error, if any, takes precedence
                if result.is_ok() {
                    return Err(e);
                }
                warn!("Dashboard reload failed after a failed deletion: {}", e);
            }
        }

        result?;
        info!(
            "Deleted from {} (reloaded: {})",
            section.query_value(),
            reloaded
        );
        Ok(DeletionOutcome::Deleted { reloaded })
    }
}
