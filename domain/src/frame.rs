use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DomainError, DomainResult};
use crate::frame_request::ClipRegion;
use crate::memory_format::{MemoryFormat, convert_buffer};

/// Largest texture, in bytes, a frame may occupy unless configured otherwise.
pub const MAX_TEXTURE_SIZE: u64 = 8 * 10u64.pow(9);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDetails {
    /// ICC profile as embedded in the image. Never applied.
    #[serde(skip)]
    pub iccp: Option<Arc<[u8]>>,
    /// Bit depth per channel of the encoded data.
    pub bit_depth: Option<u8>,
    pub alpha_channel: Option<bool>,
    pub grayscale: Option<bool>,
    /// Zero based position inside an animation.
    pub n_frame: Option<u64>,
}

/// Frame data as delivered by a decoder, not yet validated.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub memory_format: MemoryFormat,
    pub buf: Vec<u8>,
    pub delay: Option<Duration>,
    pub details: FrameDetails,
}

impl RawFrame {
    /// Packed frame with `stride = width * n_bytes`.
    pub fn packed(
        width: u32,
        height: u32,
        memory_format: MemoryFormat,
        buf: Vec<u8>,
    ) -> DomainResult<Self> {
        let stride = u32::try_from(memory_format.n_bytes())
            .ok()
            .and_then(|n_bytes| n_bytes.checked_mul(width))
            .ok_or(DomainError::DimensionTooLarge)?;

        Ok(Self {
            width,
            height,
            stride,
            memory_format,
            buf,
            delay: None,
            details: FrameDetails::default(),
        })
    }

    fn row_bytes(&self) -> DomainResult<usize> {
        to_usize(self.width)?
            .checked_mul(self.memory_format.n_bytes())
            .ok_or(DomainError::DimensionTooLarge)
    }

    fn n_bytes(&self) -> DomainResult<usize> {
        to_usize(self.stride)?
            .checked_mul(to_usize(self.height)?)
            .ok_or(DomainError::DimensionTooLarge)
    }

    /// Rejects frames whose geometry does not match their buffer.
    pub fn validate(&self, max_texture_size: u64) -> DomainResult<()> {
        if self.width < 1 || self.height < 1 {
            return Err(DomainError::WidthOrHeightZero(self.to_string()));
        }

        if to_usize(self.stride)? < self.row_bytes()? {
            return Err(DomainError::StrideTooSmall(self.to_string()));
        }

        if u64::from(self.stride) * u64::from(self.height) > max_texture_size {
            return Err(DomainError::TextureTooLarge {
                limit: max_texture_size,
            });
        }

        if self.buf.len() < self.n_bytes()? {
            return Err(DomainError::TextureTooSmall {
                texture_size: self.buf.len(),
                frame: self.to_string(),
            });
        }

        Ok(())
    }

    /// Drops row padding so that `stride == width * n_bytes`.
    pub fn remove_stride_padding(&mut self) -> DomainResult<()> {
        let row_bytes = self.row_bytes()?;
        let stride = to_usize(self.stride)?;
        let height = to_usize(self.height)?;

        if stride != row_bytes {
            for row in 1..height {
                let src = row * stride;
                self.buf.copy_within(src..src + row_bytes, row * row_bytes);
            }
            self.stride = u32::try_from(row_bytes).map_err(|_| DomainError::DimensionTooLarge)?;
        }

        self.buf.truncate(row_bytes * height);
        Ok(())
    }

    pub fn clip(&mut self, region: ClipRegion) -> DomainResult<()> {
        let fits_x = region.x.checked_add(region.width).is_some_and(|end| end <= self.width);
        let fits_y = region.y.checked_add(region.height).is_some_and(|end| end <= self.height);

        if region.width == 0 || region.height == 0 || !fits_x || !fits_y {
            return Err(DomainError::InvalidClip(format!(
                "{region} outside of {}x{}",
                self.width, self.height
            )));
        }

        let n_bytes = self.memory_format.n_bytes();
        let stride = to_usize(self.stride)?;
        let x_offset = to_usize(region.x)? * n_bytes;
        let new_row_bytes = to_usize(region.width)? * n_bytes;
        let first_row = to_usize(region.y)?;

        let mut clipped = Vec::with_capacity(new_row_bytes * to_usize(region.height)?);
        for row in first_row..first_row + to_usize(region.height)? {
            let start = row * stride + x_offset;
            let line = self
                .buf
                .get(start..start + new_row_bytes)
                .ok_or_else(|| DomainError::InvalidClip(format!("row {row} outside buffer")))?;
            clipped.extend_from_slice(line);
        }

        self.buf = clipped;
        self.width = region.width;
        self.height = region.height;
        self.stride = u32::try_from(new_row_bytes).map_err(|_| DomainError::DimensionTooLarge)?;
        Ok(())
    }

    pub fn convert_to(&mut self, target: MemoryFormat) -> DomainResult<()> {
        if target == self.memory_format {
            return Ok(());
        }

        self.buf = convert_buffer(
            self.memory_format,
            &self.buf,
            to_usize(self.width)?,
            to_usize(self.height)?,
            to_usize(self.stride)?,
            target,
        )?;
        self.memory_format = target;
        self.stride = u32::try_from(self.row_bytes()?).map_err(|_| DomainError::DimensionTooLarge)?;
        Ok(())
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} stride {} {} ({} bytes)",
            self.width,
            self.height,
            self.stride,
            self.memory_format,
            self.buf.len()
        )
    }
}

/// A decoded, validated raster. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: u32,
    memory_format: MemoryFormat,
    buf: Arc<[u8]>,
    delay: Option<Duration>,
    details: FrameDetails,
}

impl Frame {
    /// Validates `raw` and seals it. The buffer is cut to `stride * height`.
    pub fn new(mut raw: RawFrame, max_texture_size: u64) -> DomainResult<Self> {
        raw.validate(max_texture_size)?;
        let n_bytes = raw.n_bytes()?;
        raw.buf.truncate(n_bytes);

        Ok(Self {
            width: raw.width,
            height: raw.height,
            stride: raw.stride,
            memory_format: raw.memory_format,
            buf: Arc::from(raw.buf),
            delay: raw.delay,
            details: raw.details,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[must_use]
    pub fn memory_format(&self) -> MemoryFormat {
        self.memory_format
    }

    #[must_use]
    pub fn buf_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.buf)
    }

    #[must_use]
    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    /// Display duration inside an animation. `None` for still images.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    #[must_use]
    pub fn details(&self) -> &FrameDetails {
        &self.details
    }
}

fn to_usize(value: u32) -> DomainResult<usize> {
    usize::try_from(value).map_err(|_| DomainError::DimensionTooLarge)
}
