//! Background tasks for long-running lifecycle operations.
//!
//! The core is synchronous; shells that must stay responsive during an
//! extraction or a large import run the operation through [`TaskHandle`].
//! Each task produces exactly one terminal [`TaskOutcome`].
//!
//! Cancellation is cooperative. Work checks its [`CancelToken`] before it
//! starts and between archive entries or batch items. Files already written
//! stay on disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Result, SiteError};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `TaskCancelled` if cancellation was requested.
    pub fn check(&self, what: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(SiteError::TaskCancelled(what.to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub enum TaskOutcome<T> {
    Completed(T),
    Failed(SiteError),
    Cancelled,
}

enum Worker<T> {
    Running(JoinHandle<TaskOutcome<T>>),
    SpawnFailed(std::io::Error),
}

/// Handle to a task running on its own named thread.
pub struct TaskHandle<T> {
    name: String,
    cancel: CancelToken,
    worker: Worker<T>,
}

impl<T: Send + 'static> TaskHandle<T> {
    pub fn spawn<F>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T> + Send + 'static,
    {
        let name = name.into();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let task_name = name.clone();

        let spawned = thread::Builder::new()
            .name(format!("zidelok-{}", name))
            .spawn(move || {
                if token.is_cancelled() {
                    return TaskOutcome::Cancelled;
                }
                match work(&token) {
                    Ok(value) => TaskOutcome::Completed(value),
                    Err(SiteError::TaskCancelled(_)) => {
                        tracing::info!(task = %task_name, "Task cancelled");
                        TaskOutcome::Cancelled
                    }
                    Err(err) => {
                        tracing::warn!(task = %task_name, error = %err, "Task failed");
                        TaskOutcome::Failed(err)
                    }
                }
            });

        let worker = match spawned {
            Ok(handle) => Worker::Running(handle),
            Err(err) => {
                tracing::error!(task = %name, error = %err, "Failed to spawn task thread");
                Worker::SpawnFailed(err)
            }
        };

        Self {
            name,
            cancel,
            worker,
        }
    }
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests cancellation; the task stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        match &self.worker {
            Worker::Running(handle) => handle.is_finished(),
            Worker::SpawnFailed(_) => true,
        }
    }

    /// Blocks until the task reaches its terminal outcome.
    pub fn wait(self) -> TaskOutcome<T> {
        match self.worker {
            Worker::Running(handle) => handle.join().unwrap_or_else(|_| {
                TaskOutcome::Failed(SiteError::TaskFailed(format!("{} panicked", self.name)))
            }),
            Worker::SpawnFailed(err) => {
                TaskOutcome::Failed(SiteError::io(format!("spawning task {}", self.name), err))
            }
        }
    }

    /// Like [`wait`](Self::wait), flattened into a `Result`.
    pub fn join(self) -> Result<T> {
        let name = self.name.clone();
        match self.wait() {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Failed(err) => Err(err),
            TaskOutcome::Cancelled => Err(SiteError::TaskCancelled(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_completed_task() {
        let handle = TaskHandle::spawn("sum", |_| Ok(2 + 2));
        assert_eq!(handle.join().unwrap(), 4);
    }

    #[test]
    fn test_failed_task_keeps_error() {
        let handle: TaskHandle<()> =
            TaskHandle::spawn("missing", |_| Err(SiteError::SiteNotFound("x".into())));
        match handle.wait() {
            TaskOutcome::Failed(SiteError::SiteNotFound(name)) => assert_eq!(name, "x"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cooperative_cancellation() {
        let handle = TaskHandle::spawn("spin", |token| loop {
            token.check("spin")?;
            thread::sleep(Duration::from_millis(5));
        });
        handle.cancel();
        let outcome: TaskOutcome<()> = handle.wait();
        assert!(matches!(outcome, TaskOutcome::Cancelled));
    }

    #[test]
    fn test_join_reports_cancellation_as_error() {
        let handle = TaskHandle::spawn("spin", |token| loop {
            token.check("spin")?;
            thread::sleep(Duration::from_millis(5));
        });
        handle.cancel();
        let err = handle.join().map(|()| ()).unwrap_err();
        assert!(matches!(err, SiteError::TaskCancelled(_)));
    }

    #[test]
    fn test_panicking_task_fails() {
        let handle: TaskHandle<()> = TaskHandle::spawn("boom", |_| panic!("boom"));
        assert!(matches!(handle.wait(), TaskOutcome::Failed(_)));
    }

    #[test]
    fn test_token_check() {
        let token = CancelToken::new();
        assert!(token.check("x").is_ok());
        token.cancel();
        assert!(token.clone().is_cancelled());
        assert!(token.check("x").is_err());
    }
}
