pub mod channel;
pub mod completion;
pub mod producer;
pub mod runner;
pub mod supervisor;

pub use channel::{create_channel, Receiver, Sender, RENDEZVOUS_CAPACITY};
pub use completion::{CompletionCounter, DoneGuard};
pub use producer::{producer_values, spawn_producers};
pub use runner::{
    run_pipeline, FanIn, PipelineError, PipelineHandle, PipelineRunConfig,
    PipelineSummary,
};
pub use supervisor::supervise;
