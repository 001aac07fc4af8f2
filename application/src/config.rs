use std::time::Duration;

use crate::infrastructure_config::LoaderConfig;
use domain::memory_format_selection::MemoryFormatSelection;
use domain::sandbox::SandboxSelector;

/// Limits a sandboxed decoder runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_image_width: Option<u32>,
    pub max_image_height: Option<u32>,
    pub max_alloc_bytes: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub default_sandbox_selector: SandboxSelector,
    pub default_accepted_memory_formats: MemoryFormatSelection,
    pub apply_transformations: bool,
    pub decode_timeout: Duration,
    pub max_texture_size: u64,
    pub limits: DecodeLimits,
}

impl From<&LoaderConfig> for LoaderSettings {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            default_sandbox_selector: config.sandbox_selector,
            default_accepted_memory_formats: config.accepted_memory_formats,
            apply_transformations: config.apply_transformations,
            decode_timeout: Duration::from_secs(config.decode_timeout_secs),
            max_texture_size: config.max_texture_size,
            limits: DecodeLimits {
                max_image_width: config.limits.max_image_width,
                max_image_height: config.limits.max_image_height,
                max_alloc_bytes: config.limits.max_alloc_bytes,
            },
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self::from(&LoaderConfig::default())
    }
}
