use crate::config::parse::validate_config;
use crate::config::{load_or_default, PipelineConfig};
use crate::counter::{run_counter, CounterError};
use crate::pipeline::{run_pipeline, PipelineError, PipelineRunConfig, PipelineSummary};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Printed once after the last value.
pub const TRAILER: &str = "This is the end.";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("counter error: {0}")]
    Counter(#[from] CounterError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub producers: Option<usize>,
    pub items: Option<usize>,
    pub capacity: Option<usize>,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(producers) = self.producers {
            config.producer_count = producers;
        }
        if let Some(items) = self.items {
            config.items_per_producer = items;
        }
        if let Some(capacity) = self.capacity {
            config.channel_capacity = capacity;
        }
    }
}

pub async fn run(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
) -> Result<(), Box<dyn std::error::Error>> {
    run_to_stdout(config_path, overrides)
        .await
        .map(|_| ())
        .map_err(|e| e.into())
}

async fn run_to_stdout(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
) -> Result<PipelineSummary, RunError> {
    match &config_path {
        Some(path) => info!(config_path = %path.display(), "Loading configuration"),
        None => info!("No config file found, using defaults"),
    }

    let mut config = load_or_default(config_path.as_deref())?;
    overrides.apply(&mut config.pipeline);
    validate_config(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let trigger = spawn_shutdown_trigger(config.pipeline.deadline, shutdown_tx);

    let mut stdout = BufWriter::new(tokio::io::stdout());
    let result = consume_into(
        &mut stdout,
        PipelineRunConfig::from(&config.pipeline),
        Some(shutdown_rx),
    )
    .await;

    trigger.abort();
    result
}

/// Run the pipeline and write every value, then the trailer, to `out`.
///
/// Values are written in arrival order. `out` is flushed once the stream ends
/// and again after the trailer.
pub async fn consume_into<W: AsyncWrite + Unpin>(
    out: &mut W,
    config: PipelineRunConfig,
    shutdown: Option<watch::Receiver<bool>>,
) -> Result<PipelineSummary, RunError> {
    let (mut fan_in, handle) = run_pipeline(config, shutdown)?;

    while let Some(value) = fan_in.recv().await {
        if let Err(e) = out.write_all(format!("{}\n", value).as_bytes()).await {
            handle.abort();
            return Err(e.into());
        }
    }

    out.flush().await?;
    out.write_all(format!("{}\n", TRAILER).as_bytes()).await?;
    out.flush().await?;

    let summary = handle.wait().await?;
    let expected = config.total_items();
    if summary.total_sent() < expected {
        warn!(
            received = fan_in.received(),
            expected, "Pipeline stopped before all values were produced"
        );
    } else {
        info!(received = fan_in.received(), "Pipeline complete");
    }

    Ok(summary)
}

/// Flip `shutdown_tx` on Ctrl+C or once `deadline` has elapsed.
fn spawn_shutdown_trigger(
    deadline: Option<Duration>,
    shutdown_tx: watch::Sender<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline_elapsed = async {
            match deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_elapsed);

        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => {
                    warn!(error = %e, "Unable to listen for Ctrl+C");
                    (&mut deadline_elapsed).await;
                    info!(?deadline, "Deadline reached, stopping producers");
                }
            },
            _ = &mut deadline_elapsed => {
                info!(?deadline, "Deadline reached, stopping producers");
            }
        }

        let _ = shutdown_tx.send(true);
    })
}

pub async fn count(
    config_path: Option<PathBuf>,
    tasks: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    count_into(&mut stdout, config_path, tasks)
        .await
        .map(|_| ())
        .map_err(|e| e.into())
}

/// Run the shared counter and write the final count to `out`.
pub async fn count_into<W: AsyncWrite + Unpin>(
    out: &mut W,
    config_path: Option<PathBuf>,
    tasks: Option<usize>,
) -> Result<u64, RunError> {
    let mut config = load_or_default(config_path.as_deref())?;
    if let Some(tasks) = tasks {
        config.counter.tasks = tasks;
    }
    validate_config(&config)?;

    let total = run_counter(config.counter.tasks).await?;
    out.write_all(format!("{}\n", total).as_bytes()).await?;
    out.flush().await?;

    Ok(total)
}
