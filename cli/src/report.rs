use serde::Serialize;
use std::io::{self, Write};

use domain::frame::{Frame, FrameDetails};
use domain::image_info::ImageInfo;
use domain::memory_format::MemoryFormat;
use domain::sandbox::SandboxMechanism;
use domain::type_registry::{TypeKind, registered_types};

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub memory_format: MemoryFormat,
    pub delay_ms: Option<u64>,
    pub details: FrameDetails,
}

impl FrameReport {
    pub fn new(index: usize, frame: &Frame) -> Self {
        Self {
            index,
            width: frame.width(),
            height: frame.height(),
            stride: frame.stride(),
            memory_format: frame.memory_format(),
            delay_ms: frame.delay().and_then(|delay| u64::try_from(delay.as_millis()).ok()),
            details: frame.details().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub source: String,
    pub mime_type: String,
    pub info: ImageInfo,
    pub sandbox_mechanism: SandboxMechanism,
    pub frames: Vec<FrameReport>,
}

pub fn write_text(out: &mut impl Write, report: &ImageReport) -> io::Result<()> {
    let info = &report.info;
    writeln!(
        out,
        "{}: {} ({}) {}x{}, sandbox {}",
        report.source,
        report.mime_type,
        info.format_name.as_deref().unwrap_or("unknown"),
        info.width,
        info.height,
        report.sandbox_mechanism
    )?;

    if info.transformations_applied {
        writeln!(out, "  orientation applied")?;
    }

    for frame in &report.frames {
        write!(
            out,
            "  frame {}: {}x{} stride {} {}",
            frame.index, frame.width, frame.height, frame.stride, frame.memory_format
        )?;
        if let Some(delay) = frame.delay_ms {
            write!(out, ", delay {delay} ms")?;
        }
        writeln!(out)?;
    }

    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &ImageReport) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out).map_err(serde_json::Error::io)
}

pub fn write_types(out: &mut impl Write) -> io::Result<()> {
    for info in registered_types() {
        let kind = match info.kind {
            TypeKind::Enum => "enum",
            TypeKind::Flags => "flags",
        };
        writeln!(out, "{} ({kind})", info.name)?;
        for value in info.values {
            writeln!(out, "  {:>10}  {}  {}", value.value, value.name, value.nick)?;
        }
    }
    Ok(())
}
