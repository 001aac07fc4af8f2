use half::f16;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Pixel layout of a frame buffer.
///
/// Channels are stored in the order of the name. Multi-byte channels use the
/// native byte order. Discriminants are stable and part of the public
/// contract.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryFormat {
    B8g8r8a8Premultiplied = 0,
    A8r8g8b8Premultiplied = 1,
    R8g8b8a8Premultiplied = 2,
    B8g8r8a8 = 3,
    A8r8g8b8 = 4,
    R8g8b8a8 = 5,
    A8b8g8r8 = 6,
    R8g8b8 = 7,
    B8g8r8 = 8,
    R16g16b16 = 9,
    R16g16b16a16Premultiplied = 10,
    R16g16b16a16 = 11,
    R16g16b16Float = 12,
    R16g16b16a16Float = 13,
    R32g32b32Float = 14,
    R32g32b32a32FloatPremultiplied = 15,
    R32g32b32a32Float = 16,
    G8a8Premultiplied = 17,
    G8a8 = 18,
    G8 = 19,
    G16a16Premultiplied = 20,
    G16a16 = 21,
    G16 = 22,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    U8,
    U16,
    F16,
    F32,
}

impl ChannelType {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Where a normalised RGBA component is read from in the source pixel.
#[derive(Clone, Copy)]
enum Source {
    Channel(usize),
    Opaque,
}

/// What is written into a target channel.
#[derive(Clone, Copy)]
enum Target {
    R,
    G,
    B,
    A,
    RgbAvg,
}

impl MemoryFormat {
    pub const ALL: [Self; 23] = [
        Self::B8g8r8a8Premultiplied,
        Self::A8r8g8b8Premultiplied,
        Self::R8g8b8a8Premultiplied,
        Self::B8g8r8a8,
        Self::A8r8g8b8,
        Self::R8g8b8a8,
        Self::A8b8g8r8,
        Self::R8g8b8,
        Self::B8g8r8,
        Self::R16g16b16,
        Self::R16g16b16a16Premultiplied,
        Self::R16g16b16a16,
        Self::R16g16b16Float,
        Self::R16g16b16a16Float,
        Self::R32g32b32Float,
        Self::R32g32b32a32FloatPremultiplied,
        Self::R32g32b32a32Float,
        Self::G8a8Premultiplied,
        Self::G8a8,
        Self::G8,
        Self::G16a16Premultiplied,
        Self::G16a16,
        Self::G16,
    ];

    #[must_use]
    pub const fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> DomainResult<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| DomainError::UnknownEnumValue {
                type_name: "MemoryFormat",
                value: value.to_string(),
            })
    }

    /// Lower-case identifier, identical to the serialized form.
    #[must_use]
    pub const fn nick(self) -> &'static str {
        match self {
            Self::B8g8r8a8Premultiplied => "b8g8r8a8_premultiplied",
            Self::A8r8g8b8Premultiplied => "a8r8g8b8_premultiplied",
            Self::R8g8b8a8Premultiplied => "r8g8b8a8_premultiplied",
            Self::B8g8r8a8 => "b8g8r8a8",
            Self::A8r8g8b8 => "a8r8g8b8",
            Self::R8g8b8a8 => "r8g8b8a8",
            Self::A8b8g8r8 => "a8b8g8r8",
            Self::R8g8b8 => "r8g8b8",
            Self::B8g8r8 => "b8g8r8",
            Self::R16g16b16 => "r16g16b16",
            Self::R16g16b16a16Premultiplied => "r16g16b16a16_premultiplied",
            Self::R16g16b16a16 => "r16g16b16a16",
            Self::R16g16b16Float => "r16g16b16_float",
            Self::R16g16b16a16Float => "r16g16b16a16_float",
            Self::R32g32b32Float => "r32g32b32_float",
            Self::R32g32b32a32FloatPremultiplied => "r32g32b32a32_float_premultiplied",
            Self::R32g32b32a32Float => "r32g32b32a32_float",
            Self::G8a8Premultiplied => "g8a8_premultiplied",
            Self::G8a8 => "g8a8",
            Self::G8 => "g8",
            Self::G16a16Premultiplied => "g16a16_premultiplied",
            Self::G16a16 => "g16a16",
            Self::G16 => "g16",
        }
    }

    #[must_use]
    pub const fn channel_type(self) -> ChannelType {
        match self {
            Self::B8g8r8a8Premultiplied
            | Self::A8r8g8b8Premultiplied
            | Self::R8g8b8a8Premultiplied
            | Self::B8g8r8a8
            | Self::A8r8g8b8
            | Self::R8g8b8a8
            | Self::A8b8g8r8
            | Self::R8g8b8
            | Self::B8g8r8
            | Self::G8a8Premultiplied
            | Self::G8a8
            | Self::G8 => ChannelType::U8,

            Self::R16g16b16
            | Self::R16g16b16a16Premultiplied
            | Self::R16g16b16a16
            | Self::G16a16Premultiplied
            | Self::G16a16
            | Self::G16 => ChannelType::U16,

            Self::R16g16b16Float | Self::R16g16b16a16Float => ChannelType::F16,

            Self::R32g32b32Float
            | Self::R32g32b32a32FloatPremultiplied
            | Self::R32g32b32a32Float => ChannelType::F32,
        }
    }

    #[must_use]
    pub const fn n_channels(self) -> usize {
        match self {
            Self::B8g8r8a8Premultiplied
            | Self::A8r8g8b8Premultiplied
            | Self::R8g8b8a8Premultiplied
            | Self::B8g8r8a8
            | Self::A8r8g8b8
            | Self::R8g8b8a8
            | Self::A8b8g8r8
            | Self::R16g16b16a16Premultiplied
            | Self::R16g16b16a16
            | Self::R16g16b16a16Float
            | Self::R32g32b32a32FloatPremultiplied
            | Self::R32g32b32a32Float => 4,
            Self::R8g8b8
            | Self::B8g8r8
            | Self::R16g16b16
            | Self::R16g16b16Float
            | Self::R32g32b32Float => 3,
            Self::G8a8Premultiplied | Self::G8a8 | Self::G16a16Premultiplied | Self::G16a16 => 2,
            Self::G8 | Self::G16 => 1,
        }
    }

    /// Bytes per pixel.
    #[must_use]
    pub const fn n_bytes(self) -> usize {
        self.n_channels() * self.channel_type().size()
    }

    #[must_use]
    pub const fn has_alpha(self) -> bool {
        match self {
            Self::B8g8r8a8Premultiplied
            | Self::A8r8g8b8Premultiplied
            | Self::R8g8b8a8Premultiplied
            | Self::B8g8r8a8
            | Self::A8r8g8b8
            | Self::R8g8b8a8
            | Self::A8b8g8r8
            | Self::R16g16b16a16Premultiplied
            | Self::R16g16b16a16
            | Self::R16g16b16a16Float
            | Self::R32g32b32a32FloatPremultiplied
            | Self::R32g32b32a32Float
            | Self::G8a8Premultiplied
            | Self::G8a8
            | Self::G16a16Premultiplied
            | Self::G16a16 => true,

            Self::R8g8b8
            | Self::B8g8r8
            | Self::R16g16b16
            | Self::R16g16b16Float
            | Self::R32g32b32Float
            | Self::G8
            | Self::G16 => false,
        }
    }

    #[must_use]
    pub const fn is_premultiplied(self) -> bool {
        matches!(
            self,
            Self::B8g8r8a8Premultiplied
                | Self::A8r8g8b8Premultiplied
                | Self::R8g8b8a8Premultiplied
                | Self::R16g16b16a16Premultiplied
                | Self::R32g32b32a32FloatPremultiplied
                | Self::G8a8Premultiplied
                | Self::G16a16Premultiplied
        )
    }

    #[must_use]
    pub const fn is_grayscale(self) -> bool {
        matches!(
            self,
            Self::G8a8Premultiplied
                | Self::G8a8
                | Self::G8
                | Self::G16a16Premultiplied
                | Self::G16a16
                | Self::G16
        )
    }

    /// Source channel for each of `[R, G, B, A]`.
    const fn source_definition(self) -> [Source; 4] {
        use Source::{Channel, Opaque};

        match self {
            Self::B8g8r8a8Premultiplied | Self::B8g8r8a8 => {
                [Channel(2), Channel(1), Channel(0), Channel(3)]
            }
            Self::A8r8g8b8Premultiplied | Self::A8r8g8b8 => {
                [Channel(1), Channel(2), Channel(3), Channel(0)]
            }
            Self::A8b8g8r8 => [Channel(3), Channel(2), Channel(1), Channel(0)],
            Self::R8g8b8a8Premultiplied
            | Self::R8g8b8a8
            | Self::R16g16b16a16Premultiplied
            | Self::R16g16b16a16
            | Self::R16g16b16a16Float
            | Self::R32g32b32a32FloatPremultiplied
            | Self::R32g32b32a32Float => [Channel(0), Channel(1), Channel(2), Channel(3)],
            Self::R8g8b8 | Self::R16g16b16 | Self::R16g16b16Float | Self::R32g32b32Float => {
                [Channel(0), Channel(1), Channel(2), Opaque]
            }
            Self::B8g8r8 => [Channel(2), Channel(1), Channel(0), Opaque],
            Self::G8a8Premultiplied | Self::G8a8 | Self::G16a16Premultiplied | Self::G16a16 => {
                [Channel(0), Channel(0), Channel(0), Channel(1)]
            }
            Self::G8 | Self::G16 => [Channel(0), Channel(0), Channel(0), Opaque],
        }
    }

    const fn target_definition(self) -> &'static [Target] {
        match self {
            Self::B8g8r8a8Premultiplied | Self::B8g8r8a8 => {
                &[Target::B, Target::G, Target::R, Target::A]
            }
            Self::A8r8g8b8Premultiplied | Self::A8r8g8b8 => {
                &[Target::A, Target::R, Target::G, Target::B]
            }
            Self::A8b8g8r8 => &[Target::A, Target::B, Target::G, Target::R],
            Self::R8g8b8a8Premultiplied
            | Self::R8g8b8a8
            | Self::R16g16b16a16Premultiplied
            | Self::R16g16b16a16
            | Self::R16g16b16a16Float
            | Self::R32g32b32a32FloatPremultiplied
            | Self::R32g32b32a32Float => &[Target::R, Target::G, Target::B, Target::A],
            Self::R8g8b8 | Self::R16g16b16 | Self::R16g16b16Float | Self::R32g32b32Float => {
                &[Target::R, Target::G, Target::B]
            }
            Self::B8g8r8 => &[Target::B, Target::G, Target::R],
            Self::G8a8Premultiplied | Self::G8a8 | Self::G16a16Premultiplied | Self::G16a16 => {
                &[Target::RgbAvg, Target::A]
            }
            Self::G8 | Self::G16 => &[Target::RgbAvg],
        }
    }

    /// Converts a single pixel.
    pub fn transform(src_format: Self, src: &[u8], target_format: Self, target: &mut [u8]) -> DomainResult<()> {
        let rgba = src_format.to_rgba_f32(src)?;
        target_format.write_rgba_f32(rgba, target)
    }

    fn to_rgba_f32(self, pixel: &[u8]) -> DomainResult<[f32; 4]> {
        let mut rgba = [0.0_f32; 4];

        for (component, source) in rgba.iter_mut().zip(self.source_definition()) {
            *component = match source {
                Source::Channel(n) => read_channel(self.channel_type(), pixel, n)?,
                Source::Opaque => 1.0,
            };
        }

        if self.is_premultiplied() {
            let [r, g, b, a] = rgba;
            rgba = if a > 0.0 {
                [r / a, g / a, b / a, a]
            } else {
                [0.0, 0.0, 0.0, 0.0]
            };
        }

        Ok(rgba)
    }

    fn write_rgba_f32(self, [r, g, b, a]: [f32; 4], target: &mut [u8]) -> DomainResult<()> {
        let premultiply = if self.is_premultiplied() { a } else { 1.0 };

        for (n, def) in self.target_definition().iter().enumerate() {
            let value = match def {
                Target::R => r * premultiply,
                Target::G => g * premultiply,
                Target::B => b * premultiply,
                Target::A => a,
                Target::RgbAvg => (r + g + b) / 3.0 * premultiply,
            };
            write_channel(self.channel_type(), target, n, value)?;
        }

        Ok(())
    }
}

fn channel_bytes(pixel: &[u8], channel_type: ChannelType, n: usize) -> DomainResult<&[u8]> {
    let size = channel_type.size();
    pixel
        .get(n * size..(n + 1) * size)
        .ok_or_else(|| DomainError::Conversion(format!("pixel too short for channel {n}")))
}

fn read_channel(channel_type: ChannelType, pixel: &[u8], n: usize) -> DomainResult<f32> {
    let bytes = channel_bytes(pixel, channel_type, n)?;
    let value = match (channel_type, bytes) {
        (ChannelType::U8, [v]) => f32::from(*v) / f32::from(u8::MAX),
        (ChannelType::U16, [a, b]) => f32::from(u16::from_ne_bytes([*a, *b])) / f32::from(u16::MAX),
        (ChannelType::F16, [a, b]) => f16::from_ne_bytes([*a, *b]).to_f32(),
        (ChannelType::F32, [a, b, c, d]) => f32::from_ne_bytes([*a, *b, *c, *d]),
        _ => return Err(DomainError::Conversion("unexpected channel width".to_string())),
    };
    Ok(value)
}

fn write_channel(channel_type: ChannelType, target: &mut [u8], n: usize, value: f32) -> DomainResult<()> {
    let size = channel_type.size();
    let slot = target
        .get_mut(n * size..(n + 1) * size)
        .ok_or_else(|| DomainError::Conversion(format!("target too short for channel {n}")))?;

    match channel_type {
        ChannelType::U8 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = (value.clamp(0.0, 1.0) * f32::from(u8::MAX)).round() as u8;
            slot.copy_from_slice(&[v]);
        }
        ChannelType::U16 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = (value.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16;
            slot.copy_from_slice(&v.to_ne_bytes());
        }
        ChannelType::F16 => slot.copy_from_slice(&f16::from_f32(value).to_ne_bytes()),
        ChannelType::F32 => slot.copy_from_slice(&value.to_ne_bytes()),
    }

    Ok(())
}

/// Converts a whole image buffer. The returned buffer is tightly packed.
pub fn convert_buffer(
    src_format: MemoryFormat,
    src: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    target_format: MemoryFormat,
) -> DomainResult<Vec<u8>> {
    let src_row_bytes = width
        .checked_mul(src_format.n_bytes())
        .ok_or(DomainError::DimensionTooLarge)?;
    let target_stride = width
        .checked_mul(target_format.n_bytes())
        .ok_or(DomainError::DimensionTooLarge)?;
    let target_len = target_stride
        .checked_mul(height)
        .ok_or(DomainError::DimensionTooLarge)?;

    let mut target = vec![0; target_len];

    if target_stride == 0 {
        return Ok(target);
    }

    for (y, target_row) in target.chunks_exact_mut(target_stride).enumerate() {
        let start = y * stride;
        let src_row = src
            .get(start..start + src_row_bytes)
            .ok_or_else(|| DomainError::Conversion(format!("source buffer ends before row {y}")))?;

        for (src_pixel, target_pixel) in src_row
            .chunks_exact(src_format.n_bytes())
            .zip(target_row.chunks_exact_mut(target_format.n_bytes()))
        {
            MemoryFormat::transform(src_format, src_pixel, target_format, target_pixel)?;
        }
    }

    Ok(target)
}

impl fmt::Display for MemoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl FromStr for MemoryFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|format| format.nick() == wanted)
            .ok_or_else(|| DomainError::UnknownEnumValue {
                type_name: "MemoryFormat",
                value: s.to_string(),
            })
    }
}
