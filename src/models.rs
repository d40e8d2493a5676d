//! Data models and structures
//!
//! Defines the deletion targets, the article form, the storage SDK
//! configuration served by the CMS, and the client configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Largest thumbnail accepted by default (1 MiB).
pub const DEFAULT_MAX_THUMBNAIL_BYTES: u64 = 1024 * 1024;

/// Name of the clear-thumbnail checkbox rendered next to the file input.
/// The dashboard never submits it.
pub const THUMBNAIL_CLEAR_FIELD: &str = "thumbnail-clear";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTarget {
    pub topic: String,
    pub slug: String,
}

impl ArticleTarget {
    pub fn new(topic: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            slug: slug.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTarget {
    pub pk: String,
    pub name: String,
}

impl CategoryTarget {
    pub fn new(pk: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            name: name.into(),
        }
    }
}

/// Dashboard listing shown after a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardSection {
    Articles,
    Categories,
}

impl DashboardSection {
    pub fn query_value(self) -> &'static str {
        match self {
            DashboardSection::Articles => "articles",
            DashboardSection::Categories => "categories",
        }
    }
}

/// Whether the dashboard is reloaded after a deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    Always,
    OnSuccess,
    Never,
}

impl ReloadPolicy {
    pub fn should_reload(self, succeeded: bool) -> bool {
        match self {
            ReloadPolicy::Always => true,
            ReloadPolicy::OnSuccess => succeeded,
            ReloadPolicy::Never => false,
        }
    }
}

impl FromStr for ReloadPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ReloadPolicy::Always),
            "on-success" | "on_success" => Ok(ReloadPolicy::OnSuccess),
            "never" => Ok(ReloadPolicy::Never),
            other => Err(Error::Config(format!(
                "Invalid reload policy '{}'. Expected always, on-success or never",
                other
            ))),
        }
    }
}

/// Where the article form is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Update { slug: String },
}

/// Fields of the CMS article form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleForm {
    pub target: FormTarget,
    pub category: String,
    pub topic: String,
    pub body: String,
    pub posted: bool,
    pub author: Option<String>,
    /// Public download URL of the uploaded thumbnail.
    pub thumbnail: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl ArticleForm {
    pub fn new(
        category: impl Into<String>,
        topic: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            target: FormTarget::Create,
            category: category.into(),
            topic: topic.into(),
            body: body.into(),
            posted: false,
            author: None,
            thumbnail: None,
            extra: Vec::new(),
        }
    }

    pub fn for_update(mut self, slug: impl Into<String>) -> Self {
        self.target = FormTarget::Update { slug: slug.into() };
        self
    }

    pub fn with_posted(mut self, posted: bool) -> Self {
        self.posted = posted;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Url-encoded pairs for submission. The clear-thumbnail control is
    /// never emitted, even when set through `extra`.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("category".to_string(), self.category.clone()),
            ("topic".to_string(), self.topic.clone()),
            ("body".to_string(), self.body.clone()),
        ];

        if self.posted {
            fields.push(("posted".to_string(), "on".to_string()));
        }
        if let Some(author) = &self.author {
            fields.push(("author".to_string(), author.clone()));
        }
        if let Some(thumbnail) = &self.thumbnail {
            fields.push(("thumbnail".to_string(), thumbnail.clone()));
        }

        fields.extend(
            self.extra
                .iter()
                .filter(|(name, _)| name != THUMBNAIL_CLEAR_FIELD)
                .cloned(),
        );
        fields
    }
}

/// Storage SDK initialisation parameters served by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    #[serde(rename = "databaseURL")]
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FirebaseConfigEnvelope {
    pub firebase_config: FirebaseConfig,
}

/// An object written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub bucket: String,
    pub download_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firebase,
    S3,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(StorageBackend::Firebase),
            "s3" => Ok(StorageBackend::S3),
            other => Err(Error::Config(format!(
                "Invalid storage backend '{}'. Expected firebase or s3",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Firebase => write!(f, "firebase"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    pub base_url: String,
}

/// A secret that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(\"********\")")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub cms_base_url: String,
    pub email: Option<String>,
    pub password: Option<Password>,
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
    pub request_timeout: Duration,
    pub max_thumbnail_bytes: u64,
    pub article_reload: ReloadPolicy,
    pub category_reload: ReloadPolicy,
    pub storage_backend: StorageBackend,
    pub firebase_storage_url: String,
    pub firebase_auth_token: Option<String>,
    pub s3: Option<S3Settings>,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cms_base_url: "http://127.0.0.1:8000".to_string(),
            email: None,
            password: None,
            session_id: None,
            csrf_token: None,
            request_timeout: Duration::from_secs(30),
            max_thumbnail_bytes: DEFAULT_MAX_THUMBNAIL_BYTES,
            article_reload: ReloadPolicy::OnSuccess,
            category_reload: ReloadPolicy::Never,
            storage_backend: StorageBackend::Firebase,
            firebase_storage_url: "https://firebasestorage.googleapis.com".to_string(),
            firebase_auth_token: None,
            s3: None,
            dry_run: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        tolerate_missing_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Email and password to sign in with, if any. An email without a
    /// password is a configuration error.
    pub fn credentials(&self) -> Result<Option<(&str, &Password)>> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Some((email.as_str(), password))),
            (Some(_), None) => Err(Error::Config("CMS_PASSWORD not set".to_string())),
            (None, _) => Ok(None),
        }
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = match non_empty("CMS_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number(&raw, "CMS_TIMEOUT_SECS")?),
            None => defaults.request_timeout,
        };

        let max_thumbnail_bytes = match non_empty("MAX_THUMBNAIL_BYTES") {
            Some(raw) => parse_number(&raw, "MAX_THUMBNAIL_BYTES")?,
            None => defaults.max_thumbnail_bytes,
        };

        let article_reload = match non_empty("ARTICLE_DELETE_RELOAD") {
            Some(raw) => raw.parse()?,
            None => defaults.article_reload,
        };
        let category_reload = match non_empty("CATEGORY_DELETE_RELOAD") {
            Some(raw) => raw.parse()?,
            None => defaults.category_reload,
        };

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.storage_backend,
        };

        let dry_run = non_empty("DRY_RUN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let s3 = if storage_backend == StorageBackend::S3 && !dry_run {
            let require = |key: &str| {
                non_empty(key).ok_or_else(|| Error::Config(format!("{} not set", key)))
            };
            Some(S3Settings {
                access_key_id: require("CDN_ACCESS_KEY_ID")?,
                secret_access_key: require("CDN_SECRET_ACCESS_KEY")?,
                endpoint: require("CDN_ENDPOINT")?,
                bucket: require("CDN_BUCKET")?,
                base_url: require("CDN_BASE_URL")?,
            })
        } else {
            None
        };

        Ok(Self {
            cms_base_url: non_empty("CMS_BASE_URL").unwrap_or(defaults.cms_base_url),
            email: non_empty("CMS_EMAIL"),
            password: lookup("CMS_PASSWORD").filter(|v| !v.is_empty()).map(Password::new),
            session_id: non_empty("CMS_SESSION_ID"),
            csrf_token: non_empty("CMS_CSRF_TOKEN"),
            request_timeout,
            max_thumbnail_bytes,
            article_reload,
            category_reload,
            storage_backend,
            firebase_storage_url: non_empty("FIREBASE_STORAGE_URL")
                .unwrap_or(defaults.firebase_storage_url),
            firebase_auth_token: non_empty("FIREBASE_AUTH_TOKEN"),
            s3,
            dry_run,
        })
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn tolerate_missing_env_file<T>(result: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_number(raw: &str, key: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a whole number, got '{}'", key, raw)))
}
