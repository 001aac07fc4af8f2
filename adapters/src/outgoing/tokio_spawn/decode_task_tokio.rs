use std::collections::VecDeque;
use std::time::Duration;
use tokio::{task::spawn_blocking, time::timeout};
use tracing::warn;

use domain::frame::{Frame, RawFrame};
use gly_application::{
    loader::source::LoadedSource,
    ports::outgoing::decode_task::{BlockingJob, BlockingTaskError, DecodeTaskPort, TaskFuture},
    sandbox::isolation::panic_message,
};

/// Runs decoder jobs on the tokio blocking pool.
///
/// A job that outlives `timeout` is reported as timed out. The blocking
/// thread itself cannot be interrupted and finishes in the background.
pub struct TokioDecodeTaskAdapter {
    timeout: Duration,
}

impl TokioDecodeTaskAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run<T: Send + 'static>(&self, job: BlockingJob<T>) -> TaskFuture<T> {
        let duration = self.timeout;

        Box::pin(async move {
            let task = spawn_blocking(job);

            match timeout(duration, task).await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(join_error)) if join_error.is_panic() => {
                    let payload = join_error.into_panic();
                    Err(BlockingTaskError::Panicked {
                        message: panic_message(payload.as_ref()),
                    })
                }
                Ok(Err(join_error)) => Err(BlockingTaskError::Failed {
                    message: join_error.to_string(),
                }),
                Err(_) => {
                    warn!("Decoder job exceeded {:?}", duration);
                    Err(BlockingTaskError::TimedOut {
                        seconds: duration.as_secs(),
                    })
                }
            }
        })
    }
}

impl DecodeTaskPort for TokioDecodeTaskAdapter {
    fn run_load(&self, job: BlockingJob<LoadedSource>) -> TaskFuture<LoadedSource> {
        self.run(job)
    }

    fn run_decode(&self, job: BlockingJob<VecDeque<RawFrame>>) -> TaskFuture<VecDeque<RawFrame>> {
        self.run(job)
    }

    fn run_finish(&self, job: BlockingJob<Frame>) -> TaskFuture<Frame> {
        self.run(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gly_application::error::AppError;
    use std::thread;

    #[tokio::test]
    async fn job_results_are_returned() {
        let adapter = TokioDecodeTaskAdapter::new(Duration::from_secs(5));
        let result = adapter.run::<i32>(Box::new(|| Ok(41 + 1))).await.unwrap();
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn panics_become_task_errors() {
        let adapter = TokioDecodeTaskAdapter::new(Duration::from_secs(5));
        let err = adapter
            .run::<()>(Box::new(|| panic!("bad marker")))
            .await
            .unwrap_err();

        let app_error = AppError::from(err);
        match app_error {
            AppError::DecodeFailed { message } => assert!(message.contains("bad marker")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_jobs_time_out() {
        let adapter = TokioDecodeTaskAdapter::new(Duration::from_millis(20));
        let err = adapter
            .run::<()>(Box::new(|| {
                thread::sleep(Duration::from_millis(300));
                Ok(())
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, BlockingTaskError::TimedOut { seconds: 0 }));
    }
}
