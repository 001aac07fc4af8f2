use crate::{
    cancellable::Cancellable, error::AppResult, image::service::Image, loader::service::Loader,
    loader::source::Source,
};
use domain::frame::Frame;

#[async_trait::async_trait]
pub trait LoadImageUseCase: Send + Sync {
    /// Loader for `source`, configured with the service defaults.
    fn loader(&self, source: Source) -> Loader;

    /// Loads the image and decodes its first frame in one dependent chain.
    async fn load_first_frame(
        &self,
        loader: Loader,
        cancellable: Option<&Cancellable>,
    ) -> AppResult<(Image, Frame)>;
}
