//! Error handling and custom error types
//!
//! Provides unified error handling across the dashboard client using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS request to {path} failed with status {status}")]
    CmsStatus { path: String, status: u16 },

    #[error("CMS redirected {path} to the login page; sign in first")]
    Unauthenticated { path: String },

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("CMS error: {0}")]
    Cms(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;
