pub mod decode_task;
pub mod frame_scaler;
pub mod image_decoder;
pub mod sandbox_environment;
