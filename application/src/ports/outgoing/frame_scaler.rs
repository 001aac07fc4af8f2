use std::sync::Arc;

use crate::error::AppResult;
use domain::frame::RawFrame;

/// Resamples packed frames.
pub trait FrameScalerPort: Send + Sync {
    /// Returns `frame` resized to exactly `width` x `height`, keeping its
    /// memory format, delay and details.
    fn scale(&self, frame: RawFrame, width: u32, height: u32) -> AppResult<RawFrame>;
}

pub type DynFrameScalerPort = Arc<dyn FrameScalerPort>;
