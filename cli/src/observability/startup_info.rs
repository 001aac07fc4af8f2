use domain::memory_format::MemoryFormat;
use gly_application::infrastructure_config::{Config, DecoderLimitsConfig, LoaderConfig};
use tracing::debug;

pub fn log_loader_info(config: &Config) {
    debug!("Environment: {}", config.environment.env);
    print_loader_configuration(&config.loader);
    print_limits_configuration(&config.loader.limits);
}

fn print_loader_configuration(loader: &LoaderConfig) {
    debug!("⚙️  Loader:");
    debug!("  🛡️  Sandbox selector: {}", loader.sandbox_selector);
    debug!(
        "  🎨 Accepted formats: {}",
        loader
            .accepted_memory_formats
            .iter()
            .map(MemoryFormat::nick)
            .collect::<Vec<_>>()
            .join(", ")
    );
    debug!(
        "  🔄 Apply transformations: {}, decode timeout {}s",
        loader.apply_transformations, loader.decode_timeout_secs
    );
}

fn print_limits_configuration(limits: &DecoderLimitsConfig) {
    debug!(
        "  📐 Sandboxed decoder limits: width {:?}, height {:?}, alloc {:?} bytes",
        limits.max_image_width, limits.max_image_height, limits.max_alloc_bytes
    );
}
