use crate::domain::ports::{Executor, Job};
use crossbeam_channel::{unbounded, Sender};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

/// Which execution context runs the remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Run on the calling thread.
    Inline,
    /// Dedicated background worker thread with a job queue.
    #[default]
    Worker,
    /// Blocking pool of a tokio runtime.
    Tokio,
}

/// Runs each job immediately on the caller's thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// One background thread draining a FIFO job queue.
///
/// Dropping the executor closes the queue and waits for queued jobs to finish.
pub struct WorkerExecutor {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerExecutor {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                tracing::debug!("worker started");
                for job in receiver.iter() {
                    // 單一工作 panic 不應該讓 worker 結束
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("background job panicked");
                    }
                }
                tracing::debug!("worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }
}

impl Executor for WorkerExecutor {
    fn execute(&self, job: Job) {
        match &self.sender {
            Some(sender) => {
                if sender.send(job).is_err() {
                    tracing::error!("worker queue closed, job dropped");
                }
            }
            None => tracing::error!("worker already shut down, job dropped"),
        }
    }
}

impl Drop for WorkerExecutor {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
    }
}

/// Hands jobs to the blocking pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is currently running in, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) {
        // panic 由 tokio 的 JoinHandle 吸收，這裡不等待結果
        drop(self.handle.spawn_blocking(job));
    }
}
