//! Lifecycle of per-view background tasks.
//!
//! Every active view owns at most one [`TaskScope`] per concern: one for its
//! reconciliation loop and one for its log session. A scope pairs the task
//! with the token that stops it, so tearing a view down is a single
//! `cancel()` that is safe to repeat or to call after the task has ended.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

/// A spawned task plus its cancellation signal.
#[derive(Debug)]
pub struct TaskScope {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TaskScope {
    /// Spawns `task` on the current runtime, handing it a fresh token.
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let span = tracing::debug_span!("task", name);
        let handle = tokio::spawn(task(token.clone()).instrument(span));
        debug!(name, "task started");
        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signals the task to stop. Idempotent.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(name = self.name, "task cancelled");
            self.token.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels and waits for the task to wind down.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(name = self.name, error = %e, "task panicked");
                }
            }
        }
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Holds at most one live [`TaskScope`]; installing a new one cancels the old.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<TaskScope>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, scope: TaskScope) {
        if let Some(old) = self.current.replace(scope) {
            old.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(old) = self.current.take() {
            old.cancel();
        }
    }

    /// True while a task is installed and has neither finished nor been cancelled.
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| !s.is_cancelled() && !s.is_finished())
    }

    pub fn token(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(TaskScope::token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn waiter(flag: Arc<AtomicBool>) -> impl FnOnce(CancellationToken) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
        move |token| {
            Box::pin(async move {
                token.cancelled().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let stopped = Arc::new(AtomicBool::new(false));
        let scope = TaskScope::spawn("test", waiter(stopped.clone()));
        assert!(!scope.is_cancelled());

        scope.shutdown().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_after_finish() {
        let scope = TaskScope::spawn("done", |_| async {});
        while !scope.is_finished() {
            tokio::task::yield_now().await;
        }
        scope.cancel();
        scope.cancel();
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_slot_replace_cancels_previous() {
        let first = Arc::new(AtomicBool::new(false));
        let second = Arc::new(AtomicBool::new(false));
        let mut slot = TaskSlot::new();

        slot.replace(TaskScope::spawn("first", waiter(first.clone())));
        let first_token = slot.token().expect("installed");
        slot.replace(TaskScope::spawn("second", waiter(second.clone())));

        assert!(first_token.is_cancelled());
        assert!(slot.is_active());

        slot.cancel();
        slot.cancel();
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let scope = TaskScope::spawn("dropped", |token| async move { token.cancelled().await });
        let token = scope.token();
        drop(scope);
        assert!(token.is_cancelled());
    }
}
