use domain::error::DomainError;
use domain::frame::RawFrame;
use domain::memory_format::{ChannelType, MemoryFormat};
use gly_application::{
    error::{AppError, AppResult},
    ports::outgoing::frame_scaler::FrameScalerPort,
};
use image::{DynamicImage, ImageBuffer, imageops::FilterType};
use std::mem;
use tracing::instrument;

use super::decoder_image::raw_frame;

/// Resizes frames with the `image` crate's triangle filter.
///
/// Pixels are resampled as straight-alpha RGBA at the frame's channel depth
/// and converted back into the frame's own memory format.
#[derive(Clone, Copy, Default)]
pub struct ImageRsScalerAdapter;

impl ImageRsScalerAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FrameScalerPort for ImageRsScalerAdapter {
    #[instrument(skip(self, frame), fields(frame = %frame))]
    fn scale(&self, mut frame: RawFrame, width: u32, height: u32) -> AppResult<RawFrame> {
        let native = frame.memory_format;
        frame.remove_stride_padding()?;
        frame.convert_to(working_format(native))?;

        let delay = frame.delay.take();
        let details = mem::take(&mut frame.details);
        let resized = to_dynamic(frame)?.resize_exact(width, height, FilterType::Triangle);

        let mut scaled = raw_frame(resized)?;
        scaled.convert_to(native)?;
        scaled.delay = delay;
        scaled.details = details;
        Ok(scaled)
    }
}

fn working_format(format: MemoryFormat) -> MemoryFormat {
    match format.channel_type() {
        ChannelType::U8 => MemoryFormat::R8g8b8a8,
        ChannelType::U16 => MemoryFormat::R16g16b16a16,
        ChannelType::F16 | ChannelType::F32 => MemoryFormat::R32g32b32a32Float,
    }
}

fn from_ne_bytes<T, const N: usize>(bytes: &[u8], from: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .filter_map(|chunk| <[u8; N]>::try_from(chunk).ok())
        .map(from)
        .collect()
}

fn to_dynamic(frame: RawFrame) -> AppResult<DynamicImage> {
    let RawFrame {
        width,
        height,
        memory_format,
        buf,
        ..
    } = frame;

    let image = match memory_format {
        MemoryFormat::R8g8b8a8 => {
            ImageBuffer::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        MemoryFormat::R16g16b16a16 => {
            ImageBuffer::from_raw(width, height, from_ne_bytes(&buf, u16::from_ne_bytes))
                .map(DynamicImage::ImageRgba16)
        }
        MemoryFormat::R32g32b32a32Float => {
            ImageBuffer::from_raw(width, height, from_ne_bytes(&buf, f32::from_ne_bytes))
                .map(DynamicImage::ImageRgba32F)
        }
        _ => None,
    };

    image.ok_or_else(|| {
        AppError::from(DomainError::Conversion(format!(
            "cannot resample {width}x{height} {memory_format} frame"
        )))
    })
}
