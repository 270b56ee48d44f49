use crate::harvest::traits::ExtractionError;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, instrument};

/// Why a single extraction task did not succeed.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Failed(#[from] ExtractionError),
    #[error("Timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
    #[error("Task aborted: {0}")]
    Aborted(String),
}

/// Runs extraction tasks with bounded concurrency and an optional per-task timeout.
///
/// The timeout starts once the task holds a permit, so time spent queueing
/// behind other tasks does not count against it.
pub struct HarvesterExecutor {
    semaphore: Arc<Semaphore>,
    task_timeout: Option<Duration>,
}

impl HarvesterExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            task_timeout: None,
        }
    }

    pub fn with_timeout(mut self, task_timeout: Option<Duration>) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    #[instrument(skip(self, work))]
    pub async fn execute<F, T>(&self, task: &str, work: F) -> Result<T, TaskError>
    where
        F: Future<Output = Result<T, ExtractionError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TaskError::Aborted(format!("Semaphore error: {}", e)))?;

        info!("Starting extraction");
        let start = Instant::now();

        let result = match self.task_timeout {
            Some(limit) => timeout(limit, work)
                .await
                .map_err(|_| TaskError::TimedOut {
                    timeout_secs: limit.as_secs(),
                })?,
            None => work.await,
        };

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Finished extraction"
        );
        result.map_err(TaskError::Failed)
    }
}
