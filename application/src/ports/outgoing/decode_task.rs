use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::loader::source::LoadedSource;
use domain::frame::{Frame, RawFrame};

#[derive(Debug)]
pub enum BlockingTaskError {
    TimedOut { seconds: u64 },
    Panicked { message: String },
    Failed { message: String },
}

impl From<BlockingTaskError> for AppError {
    fn from(err: BlockingTaskError) -> Self {
        match err {
            BlockingTaskError::TimedOut { seconds } => Self::Timeout { seconds },
            BlockingTaskError::Panicked { message } => Self::DecodeFailed {
                message: format!("decoder panicked: {message}"),
            },
            BlockingTaskError::Failed { message } => Self::TaskError { message },
        }
    }
}

pub type BlockingJob<T> = Box<dyn FnOnce() -> AppResult<T> + Send + 'static>;

pub type TaskFuture<T> =
    Pin<Box<dyn Future<Output = Result<AppResult<T>, BlockingTaskError>> + Send + 'static>>;

/// Runs decoder work off the caller's task, bounded by a timeout.
pub trait DecodeTaskPort: Send + Sync {
    fn run_load(&self, job: BlockingJob<LoadedSource>) -> TaskFuture<LoadedSource>;

    fn run_decode(&self, job: BlockingJob<VecDeque<RawFrame>>) -> TaskFuture<VecDeque<RawFrame>>;

    fn run_finish(&self, job: BlockingJob<Frame>) -> TaskFuture<Frame>;
}

pub type DynDecodeTaskPort = Arc<dyn DecodeTaskPort>;
