//! Bounded fan-in pipeline: N producer tasks feed one shared channel, a
//! supervisor closes it once every producer has finished, and a single
//! consumer drains it until closure.

pub mod cli;
pub mod config;
pub mod counter;
pub mod pipeline;

pub use pipeline::{run_pipeline, FanIn, PipelineError, PipelineRunConfig};
