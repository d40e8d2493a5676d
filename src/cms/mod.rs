//! CMS integration for the dashboard
//!
//! Talks to the blog's HTTP endpoints: the storage configuration file,
//! article and category deletion, the dashboard listing and the article form.
//! Every view except the storage configuration requires a signed-in session.

pub mod client;
pub mod mock;

pub use client::CmsClient;
pub use mock::{CmsCall, MockCmsClient};

use crate::models::{ArticleForm, DashboardSection, FirebaseConfig};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CmsService: Send + Sync {
    /// Signs in through `/users/login/` and keeps the session for later calls.
    async fn login(&self, email: &str, password: &str) -> Result<()>;
    /// `GET /firebase/configuration/file/`
    async fn fetch_storage_config(&self) -> Result<FirebaseConfig>;
    /// `GET /article/delete/<slug>/`
    async fn delete_article(&self, slug: &str) -> Result<()>;
    /// `GET /categories/delete/<pk>/`
    async fn delete_category(&self, pk: &str) -> Result<()>;
    /// `GET /dashboard/?q=<section>`
    async fn reload_dashboard(&self, section: DashboardSection) -> Result<()>;
    /// Posts the article form and returns the URL the CMS redirected to.
    async fn submit_article(&self, form: &ArticleForm) -> Result<String>;
}
