use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use domain::frame::RawFrame;
use domain::frame_request::FrameRequest;
use domain::image_info::MimeType;
use domain::memory_format::MemoryFormat;
use domain::memory_format_selection::MemoryFormatSelection;
use domain::sandbox::{SandboxMechanism, SandboxSelector};
use gly_adapters::outgoing::{
    image_rs::{decoder_image::ImageRsDecoderAdapter, scaler_image::ImageRsScalerAdapter},
    sandbox_env::flatpak_probe::FlatpakEnvironmentProbe,
    tokio_spawn::decode_task_tokio::TokioDecodeTaskAdapter,
};
use gly_adapters::shared::loader_deps::{default_loader_deps, default_loader_service};
use gly_application::{
    cancellable::Cancellable,
    config::LoaderSettings,
    error::{AppError, AppResult},
    loader::service::{Loader, LoaderDeps},
    loader::source::Source,
    ports::incoming::loader::LoadImageUseCase,
    ports::outgoing::{
        frame_scaler::FrameScalerPort,
        image_decoder::{DecodeOptions, ImageDecoderPort, ProbedImage},
    },
};
use image::{
    Delay, DynamicImage, Frame, ImageBuffer, ImageFormat, Rgb, Rgba, codecs::gif::GifEncoder,
};

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;

fn jpeg_bytes() -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(WIDTH, HEIGHT, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn gif_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let frames = [[255, 0, 0, 255], [0, 0, 255, 255]].map(|pixel| {
            Frame::from_parts(
                ImageBuffer::from_pixel(8, 8, Rgba(pixel)),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

fn deps() -> Arc<LoaderDeps> {
    Arc::new(default_loader_deps(LoaderSettings::default()))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    Probe,
    Decode,
    Scale,
}

/// Production adapters, except that `cancellable` is canceled from the
/// blocking thread the first time `stage` runs.
struct CancelDuring {
    stage: Stage,
    cancellable: Cancellable,
    fired: AtomicBool,
    decoder: ImageRsDecoderAdapter,
    scaler: ImageRsScalerAdapter,
}

impl CancelDuring {
    fn deps(stage: Stage, cancellable: &Cancellable) -> Arc<LoaderDeps> {
        let hooks = Arc::new(Self {
            stage,
            cancellable: cancellable.clone(),
            fired: AtomicBool::new(false),
            decoder: ImageRsDecoderAdapter::new(),
            scaler: ImageRsScalerAdapter::new(),
        });
        let settings = LoaderSettings::default();

        Arc::new(LoaderDeps {
            decoder: Arc::clone(&hooks) as Arc<dyn ImageDecoderPort>,
            decode_task: Arc::new(TokioDecodeTaskAdapter::new(settings.decode_timeout)),
            sandbox_environment: Arc::new(FlatpakEnvironmentProbe::new()),
            scaler: hooks,
            settings: Arc::new(settings),
        })
    }

    fn reached(&self, stage: Stage) {
        if stage == self.stage && !self.fired.swap(true, Ordering::SeqCst) {
            self.cancellable.cancel();
        }
    }
}

impl ImageDecoderPort for CancelDuring {
    fn probe(&self, data: &[u8], options: &DecodeOptions) -> AppResult<ProbedImage> {
        self.reached(Stage::Probe);
        self.decoder.probe(data, options)
    }

    fn decode_frames(
        &self,
        data: &[u8],
        mime_type: &MimeType,
        options: &DecodeOptions,
    ) -> AppResult<Vec<RawFrame>> {
        self.reached(Stage::Decode);
        self.decoder.decode_frames(data, mime_type, options)
    }
}

impl FrameScalerPort for CancelDuring {
    fn scale(&self, frame: RawFrame, width: u32, height: u32) -> AppResult<RawFrame> {
        self.reached(Stage::Scale);
        self.scaler.scale(frame, width, height)
    }
}

#[test]
fn loads_jpeg_file_blocking() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&jpeg_bytes()).unwrap();

    let mut image = Loader::new(file.path(), &deps()).load().unwrap();
    assert_eq!(image.mime_type(), "image/jpeg");
    assert_eq!(image.info().format_name.as_deref(), Some("JPEG"));
    assert_eq!((image.info().width, image.info().height), (WIDTH, HEIGHT));

    let frame = image.next_frame().unwrap();
    assert_eq!(frame.width(), WIDTH);
    assert_eq!(frame.height(), HEIGHT);
    assert_eq!(frame.stride(), 1800);
    assert_eq!(frame.memory_format(), MemoryFormat::R8g8b8);
    assert_eq!(frame.buf_bytes().len(), 1800 * 400);
    assert_eq!(frame.details().alpha_channel, Some(false));
    assert!(!frame.memory_format().has_alpha());
}

#[tokio::test]
async fn loads_stream_asynchronously() {
    let mut image = Loader::new_for_stream(Cursor::new(jpeg_bytes()), &deps())
        .load_async(None)
        .await
        .unwrap();

    let frame = image.next_frame_async(None).await.unwrap();
    assert_eq!((frame.width(), frame.height()), (WIDTH, HEIGHT));
    assert_eq!(frame.memory_format(), MemoryFormat::R8g8b8);
}

#[tokio::test]
async fn accepted_formats_convert_frames() {
    let mut loader = Loader::new_for_bytes(jpeg_bytes(), &deps());
    loader
        .set_accepted_memory_formats(MemoryFormatSelection::G8)
        .set_sandbox_selector(SandboxSelector::NotSandboxed);

    let mut image = loader.load_async(None).await.unwrap();
    assert_eq!(image.sandbox_mechanism(), SandboxMechanism::NotSandboxed);

    let frame = image.next_frame_async(None).await.unwrap();
    assert_eq!(frame.memory_format(), MemoryFormat::G8);
    assert_eq!(frame.stride(), WIDTH);
    assert_eq!(frame.buf().len(), 600 * 400);
}

#[tokio::test]
async fn canceled_before_load_reports_canceled() {
    let cancellable = Cancellable::new();
    cancellable.cancel();

    let result = Loader::new_for_bytes(jpeg_bytes(), &deps())
        .load_async(Some(&cancellable))
        .await;
    assert!(matches!(result, Err(AppError::Canceled)));
}

#[tokio::test]
async fn cancel_during_load_never_yields_an_image() {
    let cancellable = Cancellable::new();
    let deps = CancelDuring::deps(Stage::Probe, &cancellable);

    let result = Loader::new_for_bytes(jpeg_bytes(), &deps)
        .load_async(Some(&cancellable))
        .await;
    assert!(matches!(result, Err(AppError::Canceled)));
}

#[tokio::test]
async fn frame_canceled_during_decode_is_delivered_on_retry() {
    let cancellable = Cancellable::new();
    let deps = CancelDuring::deps(Stage::Decode, &cancellable);
    let mut image = Loader::new_for_bytes(gif_bytes(), &deps)
        .load_async(None)
        .await
        .unwrap();

    let canceled = image.next_frame_async(Some(&cancellable)).await;
    assert!(matches!(canceled, Err(AppError::Canceled)));

    let first = image.next_frame_async(None).await.unwrap();
    let second = image.next_frame_async(None).await.unwrap();
    assert_eq!(first.details().n_frame, Some(0));
    assert_eq!(second.details().n_frame, Some(1));
}

#[tokio::test]
async fn still_frame_canceled_while_finishing_is_not_lost() {
    let cancellable = Cancellable::new();
    let deps = CancelDuring::deps(Stage::Scale, &cancellable);
    let mut image = Loader::new_for_bytes(jpeg_bytes(), &deps)
        .load_async(None)
        .await
        .unwrap();

    let canceled = image
        .next_frame_async_with_request(FrameRequest::default().scale(60, 40), Some(&cancellable))
        .await;
    assert!(matches!(canceled, Err(AppError::Canceled)));

    let frame = image.next_frame_async(None).await.unwrap();
    assert_eq!((frame.width(), frame.height()), (WIDTH, HEIGHT));
    assert!(matches!(
        image.next_frame_async(None).await,
        Err(AppError::NoMoreFrames)
    ));
}

#[tokio::test]
async fn scale_request_resizes_decoded_frames() {
    let mut image = Loader::new_for_bytes(jpeg_bytes(), &deps())
        .load_async(None)
        .await
        .unwrap();

    let frame = image
        .next_frame_async_with_request(FrameRequest::default().scale(60, 40), None)
        .await
        .unwrap();
    assert_eq!((frame.width(), frame.height(), frame.stride()), (60, 40, 180));
    assert_eq!(frame.memory_format(), MemoryFormat::R8g8b8);
}

#[tokio::test]
async fn still_image_has_exactly_one_frame() {
    let mut image = Loader::new_for_bytes(jpeg_bytes(), &deps())
        .load_async(None)
        .await
        .unwrap();

    image.next_frame_async(None).await.unwrap();
    assert!(matches!(
        image.next_frame_async(None).await,
        Err(AppError::NoMoreFrames)
    ));
    assert!(matches!(image.next_frame(), Err(AppError::NoMoreFrames)));
}

#[tokio::test]
async fn completion_carries_context() {
    let completion = Loader::new_for_bytes(jpeg_bytes(), &deps())
        .load_with_context(None, String::from("viewer-42"))
        .await;
    let (result, context) = completion.into_parts();

    assert_eq!(context, "viewer-42");
    let mut image = result.unwrap();

    let frame_completion = image.next_frame_with_context(None, 7u32).await;
    assert_eq!(frame_completion.context, 7);
    assert!(frame_completion.result.is_ok());
}

#[test]
fn unknown_bytes_are_rejected() {
    let err = Loader::new_for_bytes(b"GLY?not-an-image".to_vec(), &deps())
        .load()
        .err()
        .unwrap();

    assert!(matches!(err, AppError::UnknownImageFormat { .. }));
    assert!(err.unsupported_format().is_some());
}

#[tokio::test]
async fn animation_frames_arrive_in_order() {
    let mut image = Loader::new_for_bytes(gif_bytes(), &deps())
        .load_async(None)
        .await
        .unwrap();
    assert_eq!(image.mime_type(), "image/gif");

    let first = image.next_frame_async(None).await.unwrap();
    let second = image.next_frame_async(None).await.unwrap();

    assert_eq!(first.details().n_frame, Some(0));
    assert_eq!(second.details().n_frame, Some(1));
    assert_eq!(first.delay(), Some(Duration::from_millis(100)));
    assert_eq!(first.buf().get(..4), Some(&[255, 0, 0, 255][..]));
    assert_eq!(second.buf().get(..4), Some(&[0, 0, 255, 255][..]));
    assert!(matches!(
        image.next_frame_async(None).await,
        Err(AppError::NoMoreFrames)
    ));
}

#[tokio::test]
async fn use_case_loads_first_frame() {
    let service = default_loader_service(LoaderSettings::default());
    let loader = service.loader(Source::Bytes(Arc::from(jpeg_bytes())));

    let (image, frame) = service.load_first_frame(loader, None).await.unwrap();
    assert_eq!(image.info().width, frame.width());
}

#[tokio::test]
async fn geometry_is_identical_across_construction_paths() {
    let bytes = jpeg_bytes();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    let deps = deps();

    let loaders = || {
        [
            Loader::new(file.path(), &deps),
            Loader::new_for_stream(Cursor::new(bytes.clone()), &deps),
            Loader::new_for_bytes(bytes.clone(), &deps),
        ]
    };

    let mut geometries = Vec::new();
    for loader in loaders() {
        let frame = loader.load().unwrap().next_frame().unwrap();
        geometries.push((frame.width(), frame.height(), frame.stride(), frame.memory_format()));
    }
    for loader in loaders() {
        let mut image = loader.load_async(None).await.unwrap();
        let frame = image.next_frame_async(None).await.unwrap();
        geometries.push((frame.width(), frame.height(), frame.stride(), frame.memory_format()));
    }

    assert_eq!(geometries.len(), 6);
    assert!(
        geometries
            .iter()
            .all(|geometry| *geometry == (WIDTH, HEIGHT, 1800, MemoryFormat::R8g8b8))
    );
}
