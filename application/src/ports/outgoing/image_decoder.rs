use std::sync::Arc;

use crate::error::AppResult;
use crate::sandbox::policy::DecodePolicy;
use domain::frame::RawFrame;
use domain::image_info::{ImageInfo, MimeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub policy: DecodePolicy,
    /// Apply orientation metadata while decoding
    pub apply_transformations: bool,
}

#[derive(Debug, Clone)]
pub struct ProbedImage {
    pub mime_type: MimeType,
    pub info: ImageInfo,
}

/// Blocking decoder. Implementations must not panic on malformed input, but
/// callers isolate panics anyway when the policy asks for it.
pub trait ImageDecoderPort: Send + Sync {
    fn probe(&self, data: &[u8], options: &DecodeOptions) -> AppResult<ProbedImage>;

    fn decode_frames(
        &self,
        data: &[u8],
        mime_type: &MimeType,
        options: &DecodeOptions,
    ) -> AppResult<Vec<RawFrame>>;
}

pub type DynImageDecoderPort = Arc<dyn ImageDecoderPort>;
