use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipRegion {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for ClipRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Per-frame instructions applied after decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRequest {
    pub clip: Option<ClipRegion>,
    /// Target `(width, height)`. Applied after clipping.
    pub scale: Option<(u32, u32)>,
}

impl FrameRequest {
    #[must_use]
    pub fn clip(mut self, region: ClipRegion) -> Self {
        self.clip = Some(region);
        self
    }

    #[must_use]
    pub fn scale(mut self, width: u32, height: u32) -> Self {
        self.scale = Some((width, height));
        self
    }

    /// Requested size if it differs from `width` x `height`.
    pub fn scale_for(&self, width: u32, height: u32) -> DomainResult<Option<(u32, u32)>> {
        match self.scale {
            Some((scale_width, scale_height)) if scale_width == 0 || scale_height == 0 => Err(
                DomainError::InvalidScale(format!("{scale_width}x{scale_height}")),
            ),
            Some(size) if size != (width, height) => Ok(Some(size)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_to_current_size_is_skipped() {
        let request = FrameRequest::default().scale(4, 2);
        assert_eq!(request.scale_for(4, 2), Ok(None));
        assert_eq!(request.scale_for(8, 4), Ok(Some((4, 2))));
        assert_eq!(FrameRequest::default().scale_for(8, 4), Ok(None));
    }

    #[test]
    fn zero_sized_scale_is_rejected() {
        assert!(matches!(
            FrameRequest::default().scale(0, 3).scale_for(8, 4),
            Err(DomainError::InvalidScale(_))
        ));
    }

    #[test]
    fn clip_region_displays_as_geometry() {
        assert_eq!(ClipRegion::new(1, 2, 30, 40).to_string(), "30x40+1+2");
    }
}
