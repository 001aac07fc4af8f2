use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::ports::outgoing::image_decoder::ProbedImage;

/// Where the encoded image comes from. Exactly one per loader.
pub enum Source {
    File(PathBuf),
    Stream(Box<dyn Read + Send>),
    Bytes(Arc<[u8]>),
}

impl Source {
    /// Reads the complete encoded image. Blocks on file and stream sources.
    pub fn read_all(self) -> AppResult<Arc<[u8]>> {
        match self {
            Self::File(path) => fs::read(&path).map(Arc::from).map_err(|e| AppError::SourceUnreadable {
                message: format!("{}: {e}", path.display()),
            }),
            Self::Stream(mut stream) => {
                let mut data = Vec::new();
                stream
                    .read_to_end(&mut data)
                    .map_err(|e| AppError::SourceUnreadable {
                        message: format!("stream: {e}"),
                    })?;
                Ok(Arc::from(data))
            }
            Self::Bytes(bytes) => Ok(bytes),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Stream(_) => "stream",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Source contents after reading, with the detected format.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub data: Arc<[u8]>,
    pub probed: ProbedImage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn reads_streams_to_end() {
        let source = Source::Stream(Box::new(Cursor::new(vec![1, 2, 3])));
        assert_eq!(&*source.read_all().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn bytes_are_passed_through() {
        let bytes: Arc<[u8]> = Arc::from(vec![4, 5]);
        let source = Source::Bytes(Arc::clone(&bytes));
        assert!(Arc::ptr_eq(&source.read_all().unwrap(), &bytes));
    }

    #[test]
    fn unreadable_sources_are_reported() {
        let missing = Source::File(PathBuf::from("/nonexistent/gly/image.jpg"));
        assert!(matches!(missing.read_all(), Err(AppError::SourceUnreadable { .. })));

        let broken = Source::Stream(Box::new(FailingReader));
        assert!(matches!(broken.read_all(), Err(AppError::SourceUnreadable { .. })));
    }
}
