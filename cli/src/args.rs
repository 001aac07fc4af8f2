use clap::Parser;
use std::path::PathBuf;

use domain::frame_request::FrameRequest;
use domain::memory_format::MemoryFormat;
use domain::sandbox::SandboxSelector;

/// Load an image and report its frames.
#[derive(Debug, Parser)]
#[command(name = "gly", version)]
pub struct Args {
    /// Image file to load
    #[arg(required_unless_present = "list_types")]
    pub path: Option<PathBuf>,

    /// Hand the file to the loader as a byte stream
    #[arg(long, conflicts_with = "bytes")]
    pub stream: bool,

    /// Read the file into memory and load from the buffer
    #[arg(long)]
    pub bytes: bool,

    /// Use the asynchronous API. Both APIs stop waiting on Ctrl+C
    #[arg(long = "async")]
    pub run_async: bool,

    /// auto, bwrap, flatpak-spawn or not-sandboxed
    #[arg(long)]
    pub sandbox: Option<SandboxSelector>,

    /// Accepted memory format, repeatable (e.g. `r8g8b8a8`)
    #[arg(long = "accept", value_name = "FORMAT")]
    pub accept: Vec<MemoryFormat>,

    /// Resize every frame to WIDTHxHEIGHT
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_scale)]
    pub scale: Option<(u32, u32)>,

    /// Do not apply EXIF orientation
    #[arg(long)]
    pub no_transformations: bool,

    /// Decode every frame instead of only the first
    #[arg(long)]
    pub all_frames: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// List the registered enum and flag types and exit
    #[arg(long)]
    pub list_types: bool,
}

impl Args {
    #[must_use]
    pub fn frame_request(&self) -> FrameRequest {
        match self.scale {
            Some((width, height)) => FrameRequest::default().scale(width, height),
            None => FrameRequest::default(),
        }
    }
}

fn parse_scale(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let parse = |n: &str| n.trim().parse::<u32>().map_err(|e| format!("{n}: {e}"));
    Ok((parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_invocation() {
        let args = Args::try_parse_from([
            "gly",
            "photo.jpg",
            "--bytes",
            "--async",
            "--sandbox",
            "not-sandboxed",
            "--accept",
            "g8",
            "--accept",
            "r8g8b8a8",
            "--all-frames",
        ])
        .unwrap();

        assert_eq!(args.path, Some(PathBuf::from("photo.jpg")));
        assert!(args.bytes && args.run_async && args.all_frames);
        assert_eq!(args.sandbox, Some(SandboxSelector::NotSandboxed));
        assert_eq!(args.accept, vec![MemoryFormat::G8, MemoryFormat::R8g8b8a8]);
    }

    #[test]
    fn scale_becomes_a_frame_request() {
        let args = Args::try_parse_from(["gly", "a.png", "--scale", "64x32"]).unwrap();
        assert_eq!(args.frame_request(), FrameRequest::default().scale(64, 32));

        let args = Args::try_parse_from(["gly", "a.png"]).unwrap();
        assert_eq!(args.frame_request(), FrameRequest::default());

        assert!(Args::try_parse_from(["gly", "a.png", "--scale", "64"]).is_err());
        assert!(Args::try_parse_from(["gly", "a.png", "--scale", "64xbig"]).is_err());
    }

    #[test]
    fn stream_and_bytes_conflict() {
        assert!(Args::try_parse_from(["gly", "a.png", "--stream", "--bytes"]).is_err());
    }

    #[test]
    fn path_is_required_unless_listing_types() {
        assert!(Args::try_parse_from(["gly"]).is_err());
        assert!(Args::try_parse_from(["gly", "--list-types"]).is_ok());
    }

    #[test]
    fn unknown_formats_are_rejected() {
        assert!(Args::try_parse_from(["gly", "a.png", "--accept", "rgb565"]).is_err());
    }
}
