use thiserror::Error;

use crate::memory_format::MemoryFormat;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Width or height is zero: {0}")]
    WidthOrHeightZero(String),

    #[error("Stride is smaller than possible: {0}")]
    StrideTooSmall(String),

    #[error("Texture is only {texture_size} bytes but was announced differently: {frame}")]
    TextureTooSmall { texture_size: usize, frame: String },

    #[error("Texture size exceeds limit of {limit} bytes")]
    TextureTooLarge { limit: u64 },

    #[error("Dimension too large for this system")]
    DimensionTooLarge,

    #[error("Invalid clip region: {0}")]
    InvalidClip(String),

    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    #[error("No accepted memory format to convert {0:?} into")]
    NoAcceptedFormat(MemoryFormat),

    #[error("Memory format conversion failed: {0}")]
    Conversion(String),

    #[error("Unknown value {value} for {type_name}")]
    UnknownEnumValue { type_name: &'static str, value: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
