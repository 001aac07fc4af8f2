use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{AppError, AppResult};

/// Cancellation token shared between the caller and running operations.
///
/// Clones refer to the same token. Once canceled it stays canceled.
#[derive(Debug, Clone, Default)]
pub struct Cancellable {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    canceled: AtomicBool,
    in_flight: Mutex<Vec<AbortHandle>>,
}

impl Cancellable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);

        let in_flight = mem::take(
            &mut *self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in in_flight {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> AppResult<()> {
        if self.is_canceled() {
            Err(AppError::Canceled)
        } else {
            Ok(())
        }
    }

    fn register(&self, handle: AbortHandle) {
        {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            in_flight.retain(|h| !h.is_aborted());
            in_flight.push(handle.clone());
        }

        if self.is_canceled() {
            handle.abort();
        }
    }

    /// Drives `operation` unless the token is canceled first.
    ///
    /// The token is checked again before the result is handed out, so a
    /// canceled operation never reports success.
    pub async fn run<T, F>(&self, operation: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        self.check()?;

        let (handle, registration) = AbortHandle::new_pair();
        self.register(handle);

        let result = Abortable::new(operation, registration)
            .await
            .map_err(|_| AppError::Canceled)?;

        self.check()?;
        result
    }
}

/// Runs `operation` under `cancellable` if one was given.
pub async fn guard<T, F>(cancellable: Option<&Cancellable>, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match cancellable {
        Some(cancellable) => cancellable.run(operation).await,
        None => operation.await,
    }
}

/// Outcome of an asynchronous operation together with the context captured
/// when it was submitted.
#[derive(Debug)]
pub struct Completion<T, C> {
    pub result: AppResult<T>,
    pub context: C,
}

impl<T, C> Completion<T, C> {
    pub fn into_parts(self) -> (AppResult<T>, C) {
        (self.result, self.context)
    }
}
