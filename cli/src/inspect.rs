use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, instrument};

use domain::frame::Frame;
use domain::frame_request::FrameRequest;
use gly_application::{
    cancellable::{Cancellable, guard},
    error::{AppError, AppResult},
    image::service::Image,
    loader::service::Loader,
    loader::source::Source,
    ports::incoming::loader::LoadImageUseCase,
};

use crate::args::Args;
use crate::bootstrap::state::CliState;
use crate::report::{FrameReport, ImageReport};

/// Loads `path` the way `args` asks for and collects the frame geometry.
///
/// The blocking API runs on the blocking pool so that `cancellable` can
/// still interrupt the wait for it.
#[instrument(skip(state, args, cancellable), fields(path = %path.display()))]
pub async fn inspect(
    state: &CliState,
    args: &Args,
    path: &Path,
    cancellable: &Cancellable,
) -> AppResult<ImageReport> {
    let mut loader = state.loader_service.loader(open_source(path, args)?);
    configure(&mut loader, args);
    let request = args.frame_request();
    let all_frames = args.all_frames;

    let (image, frames) = if args.run_async {
        inspect_async(loader, request, all_frames, cancellable).await?
    } else {
        let blocking = spawn_blocking(move || inspect_blocking(loader, request, all_frames));
        guard(Some(cancellable), async {
            blocking.await.map_err(|e| AppError::TaskError {
                message: e.to_string(),
            })?
        })
        .await?
    };

    debug!("Collected {} frame(s)", frames.len());
    Ok(report(path, &image, frames))
}

fn inspect_blocking(
    loader: Loader,
    request: FrameRequest,
    all_frames: bool,
) -> AppResult<(Image, Vec<FrameReport>)> {
    let mut image = loader.load()?;
    let mut frames = Vec::new();

    loop {
        let more = record(&mut frames, image.next_frame_with_request(request))?;
        if !more || !all_frames {
            break;
        }
    }

    Ok((image, frames))
}

async fn inspect_async(
    loader: Loader,
    request: FrameRequest,
    all_frames: bool,
    cancellable: &Cancellable,
) -> AppResult<(Image, Vec<FrameReport>)> {
    let mut image = loader.load_async(Some(cancellable)).await?;
    let mut frames = Vec::new();

    loop {
        let next = image
            .next_frame_async_with_request(request, Some(cancellable))
            .await;
        if !record(&mut frames, next)? || !all_frames {
            break;
        }
    }

    Ok((image, frames))
}

/// Adds `next` to `frames`. `false` once the image has no frames left.
fn record(frames: &mut Vec<FrameReport>, next: AppResult<Frame>) -> AppResult<bool> {
    match next {
        Ok(frame) => {
            frames.push(FrameReport::new(frames.len(), &frame));
            Ok(true)
        }
        Err(AppError::NoMoreFrames) if !frames.is_empty() => Ok(false),
        Err(e) => Err(e),
    }
}

fn open_source(path: &Path, args: &Args) -> AppResult<Source> {
    let unreadable = |e| AppError::SourceUnreadable {
        message: format!("{}: {e}", path.display()),
    };

    if args.stream {
        let file = File::open(path).map_err(unreadable)?;
        Ok(Source::Stream(Box::new(BufReader::new(file))))
    } else if args.bytes {
        let data = fs::read(path).map_err(unreadable)?;
        Ok(Source::Bytes(Arc::from(data)))
    } else {
        Ok(Source::File(path.to_path_buf()))
    }
}

fn configure(loader: &mut Loader, args: &Args) {
    if let Some(selector) = args.sandbox {
        loader.set_sandbox_selector(selector);
    }
    if !args.accept.is_empty() {
        loader.set_accepted_memory_formats(args.accept.iter().copied().collect());
    }
    if args.no_transformations {
        loader.set_apply_transformations(false);
    }
}

fn report(path: &Path, image: &Image, frames: Vec<FrameReport>) -> ImageReport {
    ImageReport {
        source: path.display().to_string(),
        mime_type: image.mime_type().to_string(),
        info: image.info().clone(),
        sandbox_mechanism: image.sandbox_mechanism(),
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use domain::memory_format::MemoryFormat;
    use gly_application::infrastructure_config::Config;
    use image::{Delay, Frame, ImageBuffer, Rgba, codecs::gif::GifEncoder};
    use std::path::PathBuf;
    use tokio::runtime::Builder;

    fn write_gif(dir: &Path) -> PathBuf {
        let path = dir.join("blink.gif");
        let file = File::create(&path).unwrap();
        let frames = [[0, 0, 0, 255], [255, 255, 255, 255]].map(|pixel| {
            Frame::from_parts(
                ImageBuffer::from_pixel(4, 4, Rgba(pixel)),
                0,
                0,
                Delay::from_numer_denom_ms(50, 1),
            )
        });
        GifEncoder::new(file).encode_frames(frames).unwrap();
        path
    }

    fn run(flags: &[&str]) -> ImageReport {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path());
        let mut argv = vec!["gly", path.to_str().unwrap()];
        argv.extend_from_slice(flags);
        let args = Args::try_parse_from(argv).unwrap();

        let state = CliState::new(Config::default());
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime
            .block_on(inspect(&state, &args, &path, &Cancellable::new()))
            .unwrap()
    }

    #[test]
    fn first_frame_only_by_default() {
        let report = run(&[]);
        assert_eq!(report.mime_type, "image/gif");
        assert_eq!(report.frames.len(), 1);
    }

    #[test]
    fn all_frames_through_every_source() {
        let invocations: [&[&str]; 3] = [
            &["--all-frames"],
            &["--all-frames", "--stream", "--async"],
            &["--all-frames", "--bytes"],
        ];
        for flags in invocations {
            let report = run(flags);
            assert_eq!(report.frames.len(), 2, "flags {flags:?}");
            assert_eq!(report.frames[1].delay_ms, Some(50));
        }
    }

    #[test]
    fn scale_applies_to_every_frame() {
        for flags in [&["--all-frames", "--scale", "2x3"][..], &["--all-frames", "--scale", "2x3", "--async"]] {
            let report = run(flags);
            assert_eq!(report.frames.len(), 2);
            assert!(report.frames.iter().all(|frame| (frame.width, frame.height) == (2, 3)));
        }
    }

    #[test]
    fn canceled_token_interrupts_the_blocking_api() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(dir.path());
        let args = Args::try_parse_from(["gly", path.to_str().unwrap()]).unwrap();
        let state = CliState::new(Config::default());
        let cancellable = Cancellable::new();
        cancellable.cancel();

        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let result = runtime.block_on(inspect(&state, &args, &path, &cancellable));
        assert!(matches!(result, Err(AppError::Canceled)));
    }

    #[test]
    fn accepted_formats_reach_the_loader() {
        let report = run(&["--accept", "g8a8", "--async"]);
        assert_eq!(report.frames[0].memory_format, MemoryFormat::G8a8);
    }
}
