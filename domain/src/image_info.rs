use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Detected container type, e.g. `image/jpeg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MimeType(String);

impl MimeType {
    pub const JPEG: &'static str = "image/jpeg";

    #[must_use]
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self(mime_type.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MimeType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MimeType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Image-wide metadata known before any frame is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Human readable format name such as `JPEG`
    pub format_name: Option<String>,
    #[serde(skip)]
    pub exif: Option<Arc<[u8]>>,
    /// Orientation was applied, `width`/`height` are already rotated
    pub transformations_applied: bool,
}

impl ImageInfo {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}
