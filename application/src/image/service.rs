use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, instrument, warn};
use uuid::Uuid;

use crate::{
    cancellable::{Cancellable, Completion, guard},
    error::{AppError, AppResult},
    image::frame_pipeline::{FrameFinish, finish_frame},
    loader::{service::LoaderDeps, source::LoadedSource},
    ports::outgoing::image_decoder::DecodeOptions,
    sandbox::isolation,
};
use domain::frame::{Frame, RawFrame};
use domain::frame_request::FrameRequest;
use domain::image_info::{ImageInfo, MimeType};
use domain::memory_format_selection::MemoryFormatSelection;
use domain::sandbox::SandboxMechanism;

enum FrameState {
    Pending,
    Decoded(VecDeque<RawFrame>),
    Failed(AppError),
}

/// A loaded image. Hands out its frames in order.
pub struct Image {
    id: Uuid,
    mime_type: MimeType,
    info: ImageInfo,
    data: Arc<[u8]>,
    options: DecodeOptions,
    accepted: MemoryFormatSelection,
    deps: Arc<LoaderDeps>,
    state: FrameState,
}

impl Image {
    pub(crate) fn new(
        loaded: LoadedSource,
        options: DecodeOptions,
        accepted: MemoryFormatSelection,
        deps: Arc<LoaderDeps>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: loaded.probed.mime_type,
            info: loaded.probed.info,
            data: loaded.data,
            options,
            accepted,
            deps,
            state: FrameState::Pending,
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    #[must_use]
    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    /// Mechanism the image was decoded with, after resolving `Auto`.
    #[must_use]
    pub fn sandbox_mechanism(&self) -> SandboxMechanism {
        self.options.policy.mechanism
    }

    pub fn next_frame(&mut self) -> AppResult<Frame> {
        self.next_frame_with_request(FrameRequest::default())
    }

    /// Blocking. Decodes on first use.
    #[instrument(skip(self), fields(image_id = %self.id))]
    pub fn next_frame_with_request(&mut self, request: FrameRequest) -> AppResult<Frame> {
        if matches!(self.state, FrameState::Pending) {
            let result = isolation::run_blocking(&self.options.policy, || {
                self.deps
                    .decoder
                    .decode_frames(&self.data, &self.mime_type, &self.options)
                    .map(VecDeque::from)
            });
            self.settle(result);
        }

        let raw = self.front_raw()?;
        let finish = self.finish_for(request);
        let scaler = self.deps.scaler.as_ref();
        let frame = isolation::run_blocking(&self.options.policy, || {
            finish_frame(raw, &finish, scaler)
        })?;

        self.advance();
        Ok(frame)
    }

    pub async fn next_frame_async(&mut self, cancellable: Option<&Cancellable>) -> AppResult<Frame> {
        self.next_frame_async_with_request(FrameRequest::default(), cancellable)
            .await
    }

    /// Runs on the blocking pool. A call that is canceled or times out
    /// leaves the frame queued, so the next call returns the same frame.
    pub async fn next_frame_async_with_request(
        &mut self,
        request: FrameRequest,
        cancellable: Option<&Cancellable>,
    ) -> AppResult<Frame> {
        let span = info_span!("next_frame_async", image_id = %self.id);
        let frame = guard(cancellable, self.next_frame_on_pool(request))
            .instrument(span)
            .await?;

        self.advance();
        Ok(frame)
    }

    pub async fn next_frame_with_context<C: Send>(
        &mut self,
        cancellable: Option<&Cancellable>,
        context: C,
    ) -> Completion<Frame, C> {
        let result = self.next_frame_async(cancellable).await;
        Completion { result, context }
    }

    async fn next_frame_on_pool(&mut self, request: FrameRequest) -> AppResult<Frame> {
        if matches!(self.state, FrameState::Pending) {
            let decoder = Arc::clone(&self.deps.decoder);
            let data = Arc::clone(&self.data);
            let mime_type = self.mime_type.clone();
            let options = self.options;

            let result = self
                .deps
                .decode_task
                .run_decode(Box::new(move || {
                    decoder
                        .decode_frames(&data, &mime_type, &options)
                        .map(VecDeque::from)
                }))
                .await
                .map_err(AppError::from)
                .and_then(|decoded| decoded);
            self.settle(result);
        }

        let raw = self.front_raw()?;
        let finish = self.finish_for(request);
        let scaler = Arc::clone(&self.deps.scaler);
        self.deps
            .decode_task
            .run_finish(Box::new(move || finish_frame(raw, &finish, scaler.as_ref())))
            .await?
    }

    fn finish_for(&self, request: FrameRequest) -> FrameFinish {
        FrameFinish {
            accepted: self.accepted,
            request,
            max_texture_size: self.deps.settings.max_texture_size,
        }
    }

    fn settle(&mut self, result: AppResult<VecDeque<RawFrame>>) {
        self.state = match result {
            Ok(frames) => {
                debug!("Decoded {} frame(s) of {}", frames.len(), self.mime_type);
                FrameState::Decoded(frames)
            }
            Err(err) => {
                warn!("Decoding {} failed: {}", self.mime_type, err);
                FrameState::Failed(err)
            }
        };
    }

    /// Copy of the next undelivered frame. The queue is left untouched.
    fn front_raw(&self) -> AppResult<RawFrame> {
        match &self.state {
            FrameState::Decoded(frames) => frames.front().cloned().ok_or(AppError::NoMoreFrames),
            FrameState::Failed(err) => Err(err.clone()),
            FrameState::Pending => Err(AppError::TaskError {
                message: "frames requested before decoding".to_string(),
            }),
        }
    }

    /// Drops the frame that was just delivered.
    fn advance(&mut self) {
        if let FrameState::Decoded(frames) = &mut self.state {
            frames.pop_front();
        }
    }
}
