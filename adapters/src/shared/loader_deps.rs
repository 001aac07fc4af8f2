use std::sync::Arc;

use gly_application::{
    config::LoaderSettings,
    loader::service::{LoaderDeps, LoaderService},
    ports::outgoing::{
        decode_task::DecodeTaskPort, frame_scaler::FrameScalerPort,
        image_decoder::ImageDecoderPort, sandbox_environment::SandboxEnvironmentPort,
    },
};

use crate::outgoing::{
    image_rs::{decoder_image::ImageRsDecoderAdapter, scaler_image::ImageRsScalerAdapter},
    sandbox_env::flatpak_probe::FlatpakEnvironmentProbe,
    tokio_spawn::decode_task_tokio::TokioDecodeTaskAdapter,
};

/// Production wiring: `image` decoding and scaling on the tokio blocking pool.
pub fn default_loader_deps(settings: LoaderSettings) -> LoaderDeps {
    let decoder: Arc<dyn ImageDecoderPort> = Arc::new(ImageRsDecoderAdapter::new());
    let decode_task: Arc<dyn DecodeTaskPort> =
        Arc::new(TokioDecodeTaskAdapter::new(settings.decode_timeout));
    let sandbox_environment: Arc<dyn SandboxEnvironmentPort> =
        Arc::new(FlatpakEnvironmentProbe::new());
    let scaler: Arc<dyn FrameScalerPort> = Arc::new(ImageRsScalerAdapter::new());

    LoaderDeps {
        decoder,
        decode_task,
        sandbox_environment,
        scaler,
        settings: Arc::new(settings),
    }
}

pub fn default_loader_service(settings: LoaderSettings) -> LoaderService {
    LoaderService::new(default_loader_deps(settings))
}
