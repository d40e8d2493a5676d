//! Client for the blog content-management dashboard
//!
//! Confirms and performs article and category deletions against the CMS, and
//! uploads article thumbnails to object storage before submitting the article
//! form with the thumbnail's public download URL.

pub mod actions;
pub mod app;
pub mod cms;
pub mod error;
pub mod models;
pub mod prompt;
pub mod storage;
pub mod thumbnail;
pub mod uploader;

pub use error::{Error, Result};
