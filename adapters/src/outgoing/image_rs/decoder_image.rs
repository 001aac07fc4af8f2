use domain::frame::{FrameDetails, RawFrame};
use domain::image_info::{ImageInfo, MimeType};
use domain::memory_format::MemoryFormat;
use gly_application::{
    config::DecodeLimits,
    error::{AppError, AppResult},
    ports::outgoing::image_decoder::{DecodeOptions, ImageDecoderPort, ProbedImage},
};
use image::{
    AnimationDecoder, ColorType, DynamicImage, ExtendedColorType, Frames, ImageDecoder,
    ImageError, ImageFormat, ImageReader, Limits, RgbaImage,
    codecs::{gif::GifDecoder, png::PngDecoder, webp::WebPDecoder},
    metadata::Orientation,
};
use std::io::Cursor;
use std::mem;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// Decoder backed by the `image` crate.
#[derive(Clone, Copy, Default)]
pub struct ImageRsDecoderAdapter;

impl ImageRsDecoderAdapter {
    pub fn new() -> Self {
        Self
    }

    fn reader<'a>(
        data: &'a [u8],
        format: ImageFormat,
        options: &DecodeOptions,
    ) -> ImageReader<Cursor<&'a [u8]>> {
        let mut reader = ImageReader::with_format(Cursor::new(data), format);
        if let Some(limits) = options.policy.limits {
            reader.limits(image_limits(limits));
        }
        reader
    }

    #[instrument(skip(data, options), fields(len = data.len()))]
    fn probe_impl(data: &[u8], options: &DecodeOptions) -> AppResult<ProbedImage> {
        let format = detect_format(data)?;
        let mime_type = MimeType::new(format.to_mime_type());

        let mut decoder = Self::reader(data, format, options)
            .into_decoder()
            .map_err(|e| map_image_error(e, &mime_type))?;

        let (mut width, mut height) = decoder.dimensions();
        let orientation = decoder
            .orientation()
            .map_err(|e| map_image_error(e, &mime_type))?;
        let exif = decoder
            .exif_metadata()
            .map_err(|e| map_image_error(e, &mime_type))?;

        let transformations_applied =
            options.apply_transformations && orientation != Orientation::NoTransforms;
        if transformations_applied && swaps_dimensions(orientation) {
            mem::swap(&mut width, &mut height);
        }

        Ok(ProbedImage {
            mime_type,
            info: ImageInfo {
                width,
                height,
                format_name: Some(format_name(format)),
                exif: exif.map(Arc::from),
                transformations_applied,
            },
        })
    }

    #[instrument(skip(data, mime_type, options), fields(mime_type = %mime_type))]
    fn decode_frames_impl(
        data: &[u8],
        mime_type: &MimeType,
        options: &DecodeOptions,
    ) -> AppResult<Vec<RawFrame>> {
        let format = ImageFormat::from_mime_type(mime_type.as_str()).ok_or_else(|| {
            AppError::UnknownImageFormat {
                mime_type: Some(mime_type.to_string()),
                message: "No decoder for this mime type".to_string(),
            }
        })?;
        let image_err = |e| map_image_error(e, mime_type);

        let frames = match format {
            ImageFormat::Gif => {
                let mut decoder = GifDecoder::new(Cursor::new(data)).map_err(image_err)?;
                apply_limits(&mut decoder, options).map_err(image_err)?;
                let orientation = animation_orientation(&mut decoder, options).map_err(image_err)?;
                let base = details_for(decoder.original_color_type(), decoder.color_type(), None);
                collect_animation(decoder.into_frames(), &base, orientation, mime_type)?
            }
            ImageFormat::WebP => {
                let mut decoder = WebPDecoder::new(Cursor::new(data)).map_err(image_err)?;
                if decoder.has_animation() {
                    apply_limits(&mut decoder, options).map_err(image_err)?;
                    let orientation =
                        animation_orientation(&mut decoder, options).map_err(image_err)?;
                    let iccp = decoder.icc_profile().map_err(image_err)?.map(Arc::from);
                    let base =
                        details_for(decoder.original_color_type(), decoder.color_type(), iccp);
                    collect_animation(decoder.into_frames(), &base, orientation, mime_type)?
                } else {
                    vec![decode_still(data, format, mime_type, options)?]
                }
            }
            ImageFormat::Png => {
                let mut decoder = PngDecoder::new(Cursor::new(data)).map_err(image_err)?;
                if decoder.is_apng().map_err(image_err)? {
                    apply_limits(&mut decoder, options).map_err(image_err)?;
                    let orientation =
                        animation_orientation(&mut decoder, options).map_err(image_err)?;
                    let iccp = decoder.icc_profile().map_err(image_err)?.map(Arc::from);
                    let base =
                        details_for(decoder.original_color_type(), decoder.color_type(), iccp);
                    let frames = decoder.apng().map_err(image_err)?.into_frames();
                    collect_animation(frames, &base, orientation, mime_type)?
                } else {
                    vec![decode_still(data, format, mime_type, options)?]
                }
            }
            _ => vec![decode_still(data, format, mime_type, options)?],
        };

        debug!("Decoded {} frame(s)", frames.len());
        Ok(frames)
    }
}

impl ImageDecoderPort for ImageRsDecoderAdapter {
    fn probe(&self, data: &[u8], options: &DecodeOptions) -> AppResult<ProbedImage> {
        Self::probe_impl(data, options)
    }

    fn decode_frames(
        &self,
        data: &[u8],
        mime_type: &MimeType,
        options: &DecodeOptions,
    ) -> AppResult<Vec<RawFrame>> {
        Self::decode_frames_impl(data, mime_type, options)
    }
}

fn detect_format(data: &[u8]) -> AppResult<ImageFormat> {
    image::guess_format(data).map_err(|e| AppError::UnknownImageFormat {
        mime_type: None,
        message: e.to_string(),
    })
}

fn format_name(format: ImageFormat) -> String {
    format!("{format:?}").to_uppercase()
}

fn image_limits(limits: DecodeLimits) -> Limits {
    let mut image_limits = Limits::no_limits();
    image_limits.max_image_width = limits.max_image_width;
    image_limits.max_image_height = limits.max_image_height;
    image_limits.max_alloc = limits.max_alloc_bytes;
    image_limits
}

fn apply_limits(decoder: &mut impl ImageDecoder, options: &DecodeOptions) -> Result<(), ImageError> {
    match options.policy.limits {
        Some(limits) => decoder.set_limits(image_limits(limits)),
        None => Ok(()),
    }
}

fn map_image_error(err: ImageError, mime_type: &MimeType) -> AppError {
    match err {
        ImageError::Unsupported(e) => AppError::UnknownImageFormat {
            mime_type: Some(mime_type.to_string()),
            message: e.to_string(),
        },
        ImageError::Limits(e) => AppError::DecodeFailed {
            message: format!("Decoder limits exceeded: {e}"),
        },
        other => AppError::DecodeFailed {
            message: other.to_string(),
        },
    }
}

fn swaps_dimensions(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

fn details_for(
    original: ExtendedColorType,
    decoded: ColorType,
    iccp: Option<Arc<[u8]>>,
) -> FrameDetails {
    let channels = u16::from(original.channel_count().max(1));

    FrameDetails {
        iccp,
        bit_depth: u8::try_from(original.bits_per_pixel() / channels).ok(),
        alpha_channel: Some(decoded.has_alpha()),
        grayscale: Some(!decoded.has_color()),
        n_frame: None,
    }
}

fn decode_still(
    data: &[u8],
    format: ImageFormat,
    mime_type: &MimeType,
    options: &DecodeOptions,
) -> AppResult<RawFrame> {
    let image_err = |e| map_image_error(e, mime_type);

    let mut decoder = ImageRsDecoderAdapter::reader(data, format, options)
        .into_decoder()
        .map_err(image_err)?;
    let orientation = decoder.orientation().map_err(image_err)?;
    let iccp = decoder.icc_profile().map_err(image_err)?.map(Arc::from);
    let mut details = details_for(decoder.original_color_type(), decoder.color_type(), iccp);
    details.n_frame = Some(0);

    let mut image = DynamicImage::from_decoder(decoder).map_err(image_err)?;
    if options.apply_transformations {
        trace!("Applying orientation {:?}", orientation);
        image.apply_orientation(orientation);
    }

    let mut frame = raw_frame(image)?;
    frame.details = details;
    Ok(frame)
}

/// Orientation to apply to every animation frame, if transformations are on.
fn animation_orientation(
    decoder: &mut impl ImageDecoder,
    options: &DecodeOptions,
) -> Result<Option<Orientation>, ImageError> {
    if !options.apply_transformations {
        return Ok(None);
    }
    decoder
        .orientation()
        .map(|orientation| (orientation != Orientation::NoTransforms).then_some(orientation))
}

fn oriented(buffer: RgbaImage, orientation: Option<Orientation>) -> RgbaImage {
    match orientation {
        Some(orientation) => {
            let mut image = DynamicImage::ImageRgba8(buffer);
            image.apply_orientation(orientation);
            image.into_rgba8()
        }
        None => buffer,
    }
}

fn collect_animation(
    frames: Frames<'_>,
    base: &FrameDetails,
    orientation: Option<Orientation>,
    mime_type: &MimeType,
) -> AppResult<Vec<RawFrame>> {
    if let Some(orientation) = orientation {
        trace!("Applying orientation {:?} to every frame", orientation);
    }

    frames
        .enumerate()
        .map(|(n, frame)| {
            let frame = frame.map_err(|e| map_image_error(e, mime_type))?;
            let delay = Duration::from(frame.delay());
            let buffer = oriented(frame.into_buffer(), orientation);
            let (width, height) = buffer.dimensions();

            let mut raw = RawFrame::packed(width, height, MemoryFormat::R8g8b8a8, buffer.into_raw())?;
            raw.delay = Some(delay);
            raw.details = FrameDetails {
                n_frame: u64::try_from(n).ok(),
                ..base.clone()
            };
            Ok(raw)
        })
        .collect()
}

fn ne_bytes<T: Copy, const N: usize>(values: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|v| to_bytes(*v)).collect()
}

/// Maps the decoded buffer onto the matching memory format without
/// converting it.
pub(super) fn raw_frame(image: DynamicImage) -> AppResult<RawFrame> {
    let (width, height) = (image.width(), image.height());

    let (memory_format, buf) = match image {
        DynamicImage::ImageLuma8(b) => (MemoryFormat::G8, b.into_raw()),
        DynamicImage::ImageLumaA8(b) => (MemoryFormat::G8a8, b.into_raw()),
        DynamicImage::ImageRgb8(b) => (MemoryFormat::R8g8b8, b.into_raw()),
        DynamicImage::ImageRgba8(b) => (MemoryFormat::R8g8b8a8, b.into_raw()),
        DynamicImage::ImageLuma16(b) => (MemoryFormat::G16, ne_bytes(b.as_raw(), u16::to_ne_bytes)),
        DynamicImage::ImageLumaA16(b) => {
            (MemoryFormat::G16a16, ne_bytes(b.as_raw(), u16::to_ne_bytes))
        }
        DynamicImage::ImageRgb16(b) => {
            (MemoryFormat::R16g16b16, ne_bytes(b.as_raw(), u16::to_ne_bytes))
        }
        DynamicImage::ImageRgba16(b) => {
            (MemoryFormat::R16g16b16a16, ne_bytes(b.as_raw(), u16::to_ne_bytes))
        }
        DynamicImage::ImageRgb32F(b) => {
            (MemoryFormat::R32g32b32Float, ne_bytes(b.as_raw(), f32::to_ne_bytes))
        }
        DynamicImage::ImageRgba32F(b) => {
            (MemoryFormat::R32g32b32a32Float, ne_bytes(b.as_raw(), f32::to_ne_bytes))
        }
        other => (MemoryFormat::R8g8b8a8, other.to_rgba8().into_raw()),
    };

    Ok(RawFrame::packed(width, height, memory_format, buf)?)
}
