use super::CmsService;
use crate::models::{ArticleForm, DashboardSection, FirebaseConfig, FormTarget};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A request recorded by [`MockCmsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsCall {
    Login(String),
    FetchStorageConfig,
    DeleteArticle(String),
    DeleteCategory(String),
    ReloadDashboard(DashboardSection),
    SubmitArticle(ArticleForm),
}

impl CmsCall {
    /// Path the real client would request for this call.
    pub fn path(&self) -> String {
        match self {
            CmsCall::Login(_) => "/users/login/".to_string(),
            CmsCall::FetchStorageConfig => "/firebase/configuration/file/".to_string(),
            CmsCall::DeleteArticle(slug) => format!("/article/delete/{}/", slug),
            CmsCall::DeleteCategory(pk) => format!("/categories/delete/{}/", pk),
            CmsCall::ReloadDashboard(section) => {
                format!("/dashboard/?q={}", section.query_value())
            }
            CmsCall::SubmitArticle(form) => match &form.target {
                FormTarget::Create => "/article/create/".to_string(),
                FormTarget::Update { slug } => format!("/article/update/{}/", slug),
            },
        }
    }
}

#[derive(Clone)]
pub struct MockCmsClient {
    calls: Arc<Mutex<Vec<CmsCall>>>,
    storage_config: FirebaseConfig,
    delete_status: Arc<Mutex<Option<u16>>>,
    session_expired: Arc<Mutex<bool>>,
}

impl MockCmsClient {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            storage_config: FirebaseConfig {
                api_key: "mock-api-key".to_string(),
                auth_domain: "mock.firebaseapp.com".to_string(),
                database_url: "https://mock.firebasedatabase.app".to_string(),
                project_id: "mock".to_string(),
                storage_bucket: "mock.appspot.com".to_string(),
                messaging_sender_id: "0".to_string(),
                app_id: "1:0:web:mock".to_string(),
                measurement_id: None,
            },
            delete_status: Arc::new(Mutex::new(None)),
            session_expired: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_storage_config(mut self, config: FirebaseConfig) -> Self {
        self.storage_config = config;
        self
    }

    /// Makes every deletion fail with the given HTTP status.
    pub fn with_delete_failure(self, status: u16) -> Self {
        *self.delete_status.lock().unwrap() = Some(status);
        self
    }

    /// Answers every signed-in view as if the CMS redirected to the login
    /// page, until [`CmsService::login`] is called.
    pub fn with_session_expired(self) -> Self {
        *self.session_expired.lock().unwrap() = true;
        self
    }

    pub fn get_calls(&self) -> Vec<CmsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_paths(&self) -> Vec<String> {
        self.get_calls().iter().map(CmsCall::path).collect()
    }

    pub fn get_submitted_forms(&self) -> Vec<ArticleForm> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                CmsCall::SubmitArticle(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CmsCall) -> String {
        let path = call.path();
        self.calls.lock().unwrap().push(call);
        path
    }

    fn require_session(&self, path: &str) -> Result<()> {
        if *self.session_expired.lock().unwrap() {
            return Err(Error::Unauthenticated {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn delete_result(&self, path: String) -> Result<()> {
        self.require_session(&path)?;
        match *self.delete_status.lock().unwrap() {
            Some(status) => Err(Error::CmsStatus { path, status }),
            None => Ok(()),
        }
    }
}

impl Default for MockCmsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CmsService for MockCmsClient {
    async fn login(&self, email: &str, _password: &str) -> Result<()> {
        self.record(CmsCall::Login(email.to_string()));
        *self.session_expired.lock().unwrap() = false;
        Ok(())
    }

    async fn fetch_storage_config(&self) -> Result<FirebaseConfig> {
        self.record(CmsCall::FetchStorageConfig);
        Ok(self.storage_config.clone())
    }

    async fn delete_article(&self, slug: &str) -> Result<()> {
        let path = self.record(CmsCall::DeleteArticle(slug.to_string()));
        self.delete_result(path)
    }

    async fn delete_category(&self, pk: &str) -> Result<()> {
        let path = self.record(CmsCall::DeleteCategory(pk.to_string()));
        self.delete_result(path)
    }

    async fn reload_dashboard(&self, section: DashboardSection) -> Result<()> {
        let path = self.record(CmsCall::ReloadDashboard(section));
        self.require_session(&path)
    }

    async fn submit_article(&self, form: &ArticleForm) -> Result<String> {
        let path = self.record(CmsCall::SubmitArticle(form.clone()));
        self.require_session(&path)?;
        Ok(format!("/article/details/{}/", form.topic.to_lowercase()))
    }
}
