//! Thumbnail files selected for upload and the storage keys they land under.

use crate::{Error, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::Path;

/// Folder every thumbnail is written to.
pub const STORAGE_PREFIX: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Thumbnail {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Generic(format!("Thumbnail path has no file name: {}", path.display()))
            })?;
        let data = tokio::fs::read(path).await?;
        Ok(Self { file_name, data })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn content_type(&self) -> &'static str {
        detect_image_mime(&self.data).unwrap_or_else(|| mime_from_extension(&self.file_name))
    }
}

/// Storage key for an upload started at `now`.
///
/// The timestamp follows the browser's `Date.toString()` layout, e.g.
/// `images/Fri Oct 16 2026 14:03:00 GMT+0000 (UTC)-cat.png`. The parenthesised
/// part is whatever name the offset type renders: `UTC` for [`chrono::Utc`],
/// the numeric offset for [`chrono::FixedOffset`].
pub fn storage_key<Tz>(now: &DateTime<Tz>, file_name: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}/{}-{}",
        STORAGE_PREFIX,
        now.format("%a %b %d %Y %H:%M:%S GMT%z (%Z)"),
        file_name
    )
}

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

fn mime_from_extension(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized thumbnail format for {}, falling back to application/octet-stream",
                file_name
            );
            "application/octet-stream"
        }
    }
}
