//! Executors that own the thread surfaces are driven from.
//!
//! Surfaces must be created and navigated from one designated context. The
//! controller never calls into a surface directly; it posts [`Task`]s to a
//! [`MainExecutor`] and learns about completion through surface callbacks.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

/// Tracing target for executor operations.
pub(crate) const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Unit of work scheduled onto the surface context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on the context that owns the surface.
///
/// `post` must not block waiting for the task to run.
pub trait MainExecutor: Send + Sync {
    /// Schedules `task`. Tasks run in the order they were posted.
    fn post(&self, task: Task);
}

impl<T> MainExecutor for Arc<T>
where
    T: MainExecutor + ?Sized,
{
    fn post(&self, task: Task) {
        (**self).post(task);
    }
}

/// Executor backed by one dedicated named thread.
///
/// Dropping the executor closes its queue and joins the thread after the
/// queued tasks have run.
#[derive(Debug)]
pub struct ThreadExecutor {
    sender: Mutex<Option<Sender<Task>>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadExecutor {
    /// Default name given to the executor thread.
    pub const DEFAULT_THREAD_NAME: &'static str = "tealium-surface";

    /// Spawns the executor thread under `name`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised when the thread cannot be spawned.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Task>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            for task in receiver {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    warn!(target: EXECUTOR_TARGET, "surface task panicked");
                }
            }
            debug!(target: EXECUTOR_TARGET, "surface executor stopped");
        })?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Some(handle),
        })
    }
}

impl MainExecutor for ThreadExecutor {
    fn post(&self, task: Task) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let delivered = sender
            .as_ref()
            .is_some_and(|sender| sender.send(task).is_ok());
        if !delivered {
            warn!(target: EXECUTOR_TARGET, "surface executor is closed; task dropped");
        }
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = self.handle.take()
            && handle.thread().id() != thread::current().id()
            && handle.join().is_err()
        {
            warn!(target: EXECUTOR_TARGET, "surface executor thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn runs_tasks_in_order_on_named_thread() {
        let executor = ThreadExecutor::spawn("surface-test").expect("spawn executor");
        let (tx, rx) = mpsc::channel();
        for index in 0..3 {
            let tx = tx.clone();
            executor.post(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                tx.send((index, name)).expect("send result");
            }));
        }

        let results: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("task result"))
            .collect();

        assert_eq!(
            results,
            (0..3)
                .map(|index| (index, Some("surface-test".to_owned())))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn survives_panicking_task() {
        let executor = ThreadExecutor::spawn("surface-panic").expect("spawn executor");
        let (tx, rx) = mpsc::channel();

        executor.post(Box::new(|| panic!("task failure")));
        executor.post(Box::new(move || tx.send(()).expect("send")));

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn drop_runs_queued_tasks() {
        let (tx, rx) = mpsc::channel();
        {
            let executor = ThreadExecutor::spawn("surface-drop").expect("spawn executor");
            executor.post(Box::new(move || tx.send(42).expect("send")));
        }

        assert_eq!(rx.try_recv().ok(), Some(42));
    }
}
