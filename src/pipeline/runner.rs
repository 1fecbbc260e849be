use super::channel::{create_channel, Receiver, RENDEZVOUS_CAPACITY};
use super::completion::CompletionCounter;
use super::producer::spawn_producers;
use super::supervisor::supervise;
use crate::config::types::PipelineConfig;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors that can occur during pipeline operation
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("channel capacity must be at least 1")]
    InvalidCapacity,

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration for a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineRunConfig {
    pub producer_count: usize,
    pub items_per_producer: usize,
    pub channel_capacity: usize,
}

impl PipelineRunConfig {
    pub fn new(producer_count: usize, items_per_producer: usize) -> Self {
        Self {
            producer_count,
            items_per_producer,
            channel_capacity: RENDEZVOUS_CAPACITY,
        }
    }

    /// Total number of values the consumer sees on a run that is not shut down.
    pub fn total_items(&self) -> u64 {
        (self.producer_count as u64).saturating_mul(self.items_per_producer as u64)
    }
}

impl Default for PipelineRunConfig {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl From<&PipelineConfig> for PipelineRunConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            producer_count: config.producer_count,
            items_per_producer: config.items_per_producer,
            channel_capacity: config.channel_capacity,
        }
    }
}

/// Start the fan-in pipeline.
///
/// Spawns one task per producer plus the supervisor that closes the channel
/// once every producer is done. The returned [`FanIn`] is the consumer side;
/// the [`PipelineHandle`] can be awaited after the stream ends to collect
/// per-producer results and surface task panics.
///
/// When `shutdown` flips to `true`, producers stop before their next send.
/// The channel still closes through the supervisor, so the consumer always
/// terminates.
///
/// Must be called from within a tokio runtime.
pub fn run_pipeline(
    config: PipelineRunConfig,
    shutdown: Option<watch::Receiver<bool>>,
) -> Result<(FanIn, PipelineHandle), PipelineError> {
    if config.channel_capacity == 0 {
        return Err(PipelineError::InvalidCapacity);
    }

    info!(
        producers = config.producer_count,
        items_per_producer = config.items_per_producer,
        capacity = config.channel_capacity,
        "Starting fan-in pipeline"
    );

    let (tx, rx) = create_channel::<u64>(config.channel_capacity);
    let done = CompletionCounter::new(config.producer_count);

    let producers = spawn_producers(
        config.producer_count,
        config.items_per_producer,
        &tx,
        &done,
        shutdown,
    );

    // The supervisor takes the original sender; producers only hold clones.
    let supervisor = supervise(Arc::clone(&done), tx);

    Ok((
        FanIn { rx, received: 0 },
        PipelineHandle {
            supervisor,
            producers,
            done,
        },
    ))
}

/// Consumer side of the pipeline.
///
/// Yields values in arrival order and ends once the channel is closed and
/// drained. Not restartable.
#[derive(Debug)]
pub struct FanIn {
    rx: Receiver<u64>,
    received: u64,
}

impl FanIn {
    /// Receive the next value, or `None` once every producer has finished and
    /// the channel is drained.
    pub async fn recv(&mut self) -> Option<u64> {
        let value = self.rx.recv().await;
        if value.is_some() {
            self.received += 1;
        }
        value
    }

    /// Number of values received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Drain the remaining values into a vector.
    pub async fn collect_all(mut self) -> Vec<u64> {
        let mut values = Vec::new();
        while let Some(value) = self.recv().await {
            values.push(value);
        }
        values
    }
}

impl Stream for FanIn {
    type Item = u64;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<u64>> {
        let this = self.get_mut();
        let poll = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = poll {
            this.received += 1;
        }
        poll
    }
}

/// Result of a finished pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Values sent by each producer, indexed by producer.
    pub sent_per_producer: Vec<u64>,
}

impl PipelineSummary {
    pub fn total_sent(&self) -> u64 {
        self.sent_per_producer.iter().sum()
    }
}

/// Handle to the running pipeline
pub struct PipelineHandle {
    supervisor: JoinHandle<()>,
    producers: Vec<JoinHandle<u64>>,
    done: Arc<CompletionCounter>,
}

impl PipelineHandle {
    /// Number of producers that have finished so far.
    pub fn completed_producers(&self) -> usize {
        self.done.completed()
    }

    /// Wait for the supervisor and every producer task to complete.
    pub async fn wait(self) -> Result<PipelineSummary, PipelineError> {
        self.supervisor.await?;

        let mut sent_per_producer = Vec::with_capacity(self.producers.len());
        for task in self.producers {
            sent_per_producer.push(task.await?);
        }

        let summary = PipelineSummary { sent_per_producer };
        debug!(total_sent = summary.total_sent(), "Pipeline tasks joined");
        Ok(summary)
    }

    /// Abort the supervisor and all producer tasks
    pub fn abort(&self) {
        for task in &self.producers {
            task.abort();
        }
        self.supervisor.abort();
    }
}
