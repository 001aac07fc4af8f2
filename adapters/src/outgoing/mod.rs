pub mod image_rs;
pub mod sandbox_env;
pub mod tokio_spawn;
