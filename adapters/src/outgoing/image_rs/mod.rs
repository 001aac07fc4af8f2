pub mod decoder_image;
pub mod scaler_image;
