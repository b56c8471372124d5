//! Deferred actions
//!
//! A limited advertisement is stopped by an action that is scheduled to run once the duration
//! has elapsed. The action runs in a different context from the owner of the
//! [`Advertiser`](super::Advertiser), so it must be `Send`.

use std::time::Duration;

/// A scheduler of deferred actions
pub trait Scheduler {
    /// A handle to a scheduled action
    type Handle: Send;

    /// Run `action` once `delay` has elapsed
    fn schedule<F>(&self, delay: Duration, action: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static;

    /// Cancel a scheduled action
    ///
    /// Cancelling an action that has already run (or is running) has no effect.
    fn cancel(&self, handle: Self::Handle);
}

/// A [`Scheduler`] that runs actions as tokio tasks
///
/// The delay is awaited within a task, but the action itself is run on the blocking thread pool
/// of the runtime. The action locks the advertiser and stops the transport, and neither may stall
/// the worker threads.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Create a `TokioScheduler` for the current runtime
    ///
    /// # Panic
    /// This must be called within the context of a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    type Handle = tokio::task::JoinHandle<()>;

    fn schedule<F>(&self, delay: Duration, action: F) -> Self::Handle
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(e) = tokio::task::spawn_blocking(action).await {
                log::error!("scheduled action failed: {}", e);
            }
        })
    }

    fn cancel(&self, handle: Self::Handle) {
        handle.abort()
    }
}
