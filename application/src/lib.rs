#[cfg(any(feature = "adapters", feature = "image", feature = "tokio"))]
compile_error!("application must not depend on adapters/framework crates");

pub mod cancellable;
pub mod config;
pub mod error;
pub mod image;
pub mod infrastructure_config;
pub mod loader;
pub mod ports;
pub mod sandbox;
