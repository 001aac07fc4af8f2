use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::ports::outgoing::frame_scaler::FrameScalerPort;
use domain::error::DomainError;
use domain::frame::{Frame, RawFrame};
use domain::frame_request::FrameRequest;
use domain::memory_format_selection::MemoryFormatSelection;

/// Everything needed to turn a decoder frame into a [`Frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameFinish {
    pub accepted: MemoryFormatSelection,
    pub request: FrameRequest,
    pub max_texture_size: u64,
}

/// Validates, packs, clips, scales and converts a decoded frame.
///
/// Nothing is returned unless every step succeeded.
#[instrument(skip(raw, scaler), fields(frame = %raw))]
pub fn finish_frame(
    mut raw: RawFrame,
    finish: &FrameFinish,
    scaler: &dyn FrameScalerPort,
) -> AppResult<Frame> {
    raw.validate(finish.max_texture_size)?;
    raw.remove_stride_padding()?;

    if let Some(region) = finish.request.clip {
        raw.clip(region)?;
    }

    if let Some((width, height)) = finish.request.scale_for(raw.width, raw.height)? {
        debug!("Scaling frame from {}x{} to {}x{}", raw.width, raw.height, width, height);
        raw = scaler.scale(raw, width, height)?;
        raw.validate(finish.max_texture_size)?;
    }

    let native = raw.memory_format;
    let target = finish
        .accepted
        .best_format_for(native)
        .ok_or(DomainError::NoAcceptedFormat(native))?;

    if target != native {
        debug!("Converting frame from {} to {}", native, target);
        raw.convert_to(target)?;
    }

    Ok(Frame::new(raw, finish.max_texture_size)?)
}
