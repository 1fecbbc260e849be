use crate::pipeline::CompletionCounter;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Spawn `tasks` tasks that each increment one mutex-guarded counter, wait
/// until all of them have signalled completion, and return the final count.
///
/// The result always equals `tasks`.
pub async fn run_counter(tasks: usize) -> Result<u64, CounterError> {
    info!(tasks, "Starting shared counter");

    let count = Arc::new(Mutex::new(0u64));
    let done = CompletionCounter::new(tasks);

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let count = Arc::clone(&count);
            let guard = done.guard();
            tokio::spawn(async move {
                let mut count = count.lock().await;
                *count += 1;
                // Lock is released before completion is signalled.
                drop(count);
                drop(guard);
            })
        })
        .collect();

    done.wait().await;

    for handle in handles {
        handle.await?;
    }

    let total = *count.lock().await;
    debug!(total, "Shared counter finished");
    Ok(total)
}
