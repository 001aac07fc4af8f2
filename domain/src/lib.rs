pub mod error;
pub mod frame;
pub mod frame_request;
pub mod image_info;
pub mod memory_format;
pub mod memory_format_selection;
pub mod sandbox;
pub mod type_registry;
