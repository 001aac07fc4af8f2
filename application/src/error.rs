use thiserror::Error;

use domain::error::DomainError;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Source unreadable: {message}")]
    SourceUnreadable { message: String },

    #[error("Unknown image format: {message}")]
    UnknownImageFormat {
        mime_type: Option<String>,
        message: String,
    },

    #[error("Decoding failed: {message}")]
    DecodeFailed { message: String },

    #[error("No more frames available")]
    NoMoreFrames,

    #[error("Operation was canceled")]
    Canceled,

    #[error("Task error: {message}")]
    TaskError { message: String },

    #[error("Decoding did not finish within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AppError {
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Mime type (or description) of the unsupported format, if this error is
    /// about one.
    #[must_use]
    pub fn unsupported_format(&self) -> Option<String> {
        match self {
            Self::UnknownImageFormat { mime_type, message } => {
                Some(mime_type.clone().unwrap_or_else(|| message.clone()))
            }
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
