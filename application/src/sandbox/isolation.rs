use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::sandbox::policy::DecodePolicy;

/// Runs blocking decoder work on the current thread under `policy`.
pub fn run_blocking<T>(policy: &DecodePolicy, job: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
    if !policy.isolate_panics {
        return job();
    }

    panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!("Decoder panicked under {}: {}", policy.mechanism, message);
        Err(AppError::DecodeFailed {
            message: format!("decoder panicked: {message}"),
        })
    })
}

#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
