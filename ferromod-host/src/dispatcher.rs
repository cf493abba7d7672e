//! Per-stream execution context
//!
//! A [`Dispatcher`] is the posting half: cheap to clone and usable from any
//! thread. The [`EventLoop`] is the consuming half and runs tasks in submission
//! order on whichever thread owns the stream.

use kanal::{Receiver, Sender};
use std::time::Duration;

/// Deferred work for the owning context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Posts tasks onto an [`EventLoop`].
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Task>,
}

impl Dispatcher {
    /// Queue `task` to run later on the owning context. Returns `false` when
    /// the event loop is gone and the task was dropped.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queued", &self.tx.len())
            .finish()
    }
}

/// Single-consumer task queue.
pub struct EventLoop {
    rx: Receiver<Task>,
}

impl EventLoop {
    /// Create an event loop and its dispatcher.
    pub fn new() -> (Dispatcher, Self) {
        let (tx, rx) = kanal::unbounded();
        (Dispatcher { tx }, Self { rx })
    }

    /// Run every task queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(Some(task)) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one task and run it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(_) => false,
        }
    }

    /// Run tasks until every dispatcher has been dropped.
    pub async fn run(self) {
        let rx = self.rx.to_async();
        while let Ok(task) = rx.recv().await {
            task();
        }
        tracing::debug!("Event loop finished");
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
