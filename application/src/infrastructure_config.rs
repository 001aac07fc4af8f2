use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use domain::frame::MAX_TEXTURE_SIZE;
use domain::memory_format_selection::MemoryFormatSelection;
use domain::sandbox::SandboxSelector;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub loader: LoaderConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub sandbox_selector: SandboxSelector,
    pub accepted_memory_formats: MemoryFormatSelection,
    pub apply_transformations: bool,
    pub decode_timeout_secs: u64,
    pub max_texture_size: u64,
    pub limits: DecoderLimitsConfig,
}

/// Resource limits handed to the decoder for sandboxed mechanisms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderLimitsConfig {
    pub max_image_width: Option<u32>,
    pub max_image_height: Option<u32>,
    pub max_alloc_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

impl Default for DecoderLimitsConfig {
    fn default() -> Self {
        Self {
            max_image_width: Some(65_535),
            max_image_height: Some(65_535),
            max_alloc_bytes: Some(2 * 1024 * 1024 * 1024),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sandbox_selector: SandboxSelector::Auto,
            accepted_memory_formats: MemoryFormatSelection::all(),
            apply_transformations: true,
            decode_timeout_secs: 60,
            max_texture_size: MAX_TEXTURE_SIZE,
            limits: DecoderLimitsConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.loader.decode_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "decode_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.loader.max_texture_size == 0 {
            return Err(AppError::ConfigError {
                message: "max_texture_size must be greater than 0".to_string(),
            });
        }

        if self.loader.accepted_memory_formats.is_empty() {
            return Err(AppError::ConfigError {
                message: "accepted_memory_formats cannot be empty".to_string(),
            });
        }

        let limits = &self.loader.limits;
        if limits.max_image_width == Some(0)
            || limits.max_image_height == Some(0)
            || limits.max_alloc_bytes == Some(0)
        {
            return Err(AppError::ConfigError {
                message: "Decoder limits must be greater than 0 when set".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "logging level cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = Config::default();
        config.loader.decode_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(AppError::ConfigError { .. })));
    }

    #[test]
    fn rejects_empty_format_selection() {
        let mut config = Config::default();
        config.loader.accepted_memory_formats = MemoryFormatSelection::EMPTY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_limits() {
        let mut config = Config::default();
        config.loader.limits.max_alloc_bytes = Some(0);
        assert!(config.validate().is_err());

        config.loader.limits.max_alloc_bytes = None;
        config.validate().unwrap();
    }

    #[test]
    fn reads_format_names_from_json() {
        let loader: LoaderConfig = serde_json::from_value(serde_json::json!({
            "sandbox_selector": "not-sandboxed",
            "accepted_memory_formats": ["g8"],
            "apply_transformations": false,
            "decode_timeout_secs": 5,
            "max_texture_size": 1024,
            "limits": { "max_image_width": null, "max_image_height": null, "max_alloc_bytes": null }
        }))
        .unwrap();

        assert_eq!(loader.sandbox_selector, SandboxSelector::NotSandboxed);
        assert_eq!(loader.accepted_memory_formats, MemoryFormatSelection::G8);
    }
}
