use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, instrument};
use uuid::Uuid;

use crate::{
    cancellable::{Cancellable, Completion, guard},
    config::LoaderSettings,
    error::AppResult,
    image::service::Image,
    loader::source::{LoadedSource, Source},
    ports::{
        incoming::loader::LoadImageUseCase,
        outgoing::{
            decode_task::DynDecodeTaskPort,
            frame_scaler::DynFrameScalerPort,
            image_decoder::{DecodeOptions, DynImageDecoderPort, ImageDecoderPort},
            sandbox_environment::DynSandboxEnvironmentPort,
        },
    },
    sandbox::{isolation, policy},
};
use domain::frame::Frame;
use domain::memory_format_selection::MemoryFormatSelection;
use domain::sandbox::SandboxSelector;

pub struct LoaderDeps {
    pub decoder: DynImageDecoderPort,
    pub decode_task: DynDecodeTaskPort,
    pub sandbox_environment: DynSandboxEnvironmentPort,
    pub scaler: DynFrameScalerPort,
    pub settings: Arc<LoaderSettings>,
}

/// Turns one [`Source`] into an [`Image`].
///
/// Loading consumes the loader, so its configuration cannot change once a
/// load has started.
pub struct Loader {
    source: Source,
    sandbox_selector: SandboxSelector,
    accepted_memory_formats: MemoryFormatSelection,
    apply_transformations: bool,
    deps: Arc<LoaderDeps>,
}

impl Loader {
    #[must_use]
    pub fn from_source(source: Source, deps: &Arc<LoaderDeps>) -> Self {
        Self {
            source,
            sandbox_selector: deps.settings.default_sandbox_selector,
            accepted_memory_formats: deps.settings.default_accepted_memory_formats,
            apply_transformations: deps.settings.apply_transformations,
            deps: Arc::clone(deps),
        }
    }

    #[must_use]
    pub fn new(path: impl Into<PathBuf>, deps: &Arc<LoaderDeps>) -> Self {
        Self::from_source(Source::File(path.into()), deps)
    }

    #[must_use]
    pub fn new_for_stream(stream: impl Read + Send + 'static, deps: &Arc<LoaderDeps>) -> Self {
        Self::from_source(Source::Stream(Box::new(stream)), deps)
    }

    #[must_use]
    pub fn new_for_bytes(bytes: impl Into<Arc<[u8]>>, deps: &Arc<LoaderDeps>) -> Self {
        Self::from_source(Source::Bytes(bytes.into()), deps)
    }

    pub fn set_sandbox_selector(&mut self, sandbox_selector: SandboxSelector) -> &mut Self {
        self.sandbox_selector = sandbox_selector;
        self
    }

    /// Frames are converted into a member of `formats` if their native
    /// format is not part of it.
    pub fn set_accepted_memory_formats(&mut self, formats: MemoryFormatSelection) -> &mut Self {
        self.accepted_memory_formats = formats;
        self
    }

    pub fn set_apply_transformations(&mut self, apply_transformations: bool) -> &mut Self {
        self.apply_transformations = apply_transformations;
        self
    }

    #[must_use]
    pub fn sandbox_selector(&self) -> SandboxSelector {
        self.sandbox_selector
    }

    #[must_use]
    pub fn accepted_memory_formats(&self) -> MemoryFormatSelection {
        self.accepted_memory_formats
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            policy: policy::resolve(
                self.sandbox_selector,
                self.deps.sandbox_environment.as_ref(),
                &self.deps.settings,
            ),
            apply_transformations: self.apply_transformations,
        }
    }

    /// Blocking load on the current thread.
    #[instrument(skip(self), fields(source = self.source.kind(), load_id = %Uuid::new_v4()))]
    pub fn load(self) -> AppResult<Image> {
        let options = self.decode_options();
        let decoder = Arc::clone(&self.deps.decoder);
        let source = self.source;

        let loaded = isolation::run_blocking(&options.policy, || {
            read_and_probe(decoder.as_ref(), source, &options)
        })?;

        Ok(Image::new(loaded, options, self.accepted_memory_formats, self.deps))
    }

    /// Loads on the blocking pool. The returned future does not block.
    pub async fn load_async(self, cancellable: Option<&Cancellable>) -> AppResult<Image> {
        let span = info_span!("load_async", source = self.source.kind(), load_id = %Uuid::new_v4());

        guard(cancellable, self.load_on_pool()).instrument(span).await
    }

    /// Like [`Self::load_async`], handing `context` back unchanged with the
    /// result.
    pub async fn load_with_context<C: Send>(
        self,
        cancellable: Option<&Cancellable>,
        context: C,
    ) -> Completion<Image, C> {
        let result = self.load_async(cancellable).await;
        Completion { result, context }
    }

    async fn load_on_pool(self) -> AppResult<Image> {
        let options = self.decode_options();
        let decoder = Arc::clone(&self.deps.decoder);
        let source = self.source;

        let loaded = self
            .deps
            .decode_task
            .run_load(Box::new(move || read_and_probe(decoder.as_ref(), source, &options)))
            .await??;

        Ok(Image::new(loaded, options, self.accepted_memory_formats, self.deps))
    }
}

pub(crate) fn read_and_probe(
    decoder: &dyn ImageDecoderPort,
    source: Source,
    options: &DecodeOptions,
) -> AppResult<LoadedSource> {
    let data = source.read_all()?;
    let probed = decoder.probe(&data, options)?;

    debug!(
        "Detected {} ({}x{}) in {} bytes",
        probed.mime_type,
        probed.info.width,
        probed.info.height,
        data.len()
    );

    Ok(LoadedSource { data, probed })
}

/// Creates loaders that share one set of dependencies.
#[derive(Clone)]
pub struct LoaderService {
    deps: Arc<LoaderDeps>,
}

impl LoaderService {
    #[must_use]
    pub fn new(deps: LoaderDeps) -> Self {
        Self {
            deps: Arc::new(deps),
        }
    }

    #[must_use]
    pub fn deps(&self) -> &Arc<LoaderDeps> {
        &self.deps
    }

    #[must_use]
    pub fn settings(&self) -> &LoaderSettings {
        &self.deps.settings
    }
}

#[async_trait::async_trait]
impl LoadImageUseCase for LoaderService {
    fn loader(&self, source: Source) -> Loader {
        Loader::from_source(source, &self.deps)
    }

    async fn load_first_frame(
        &self,
        loader: Loader,
        cancellable: Option<&Cancellable>,
    ) -> AppResult<(Image, Frame)> {
        let mut image = loader.load_async(cancellable).await?;
        let frame = image.next_frame_async(cancellable).await?;
        Ok((image, frame))
    }
}
