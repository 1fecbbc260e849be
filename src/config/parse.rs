use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Upper bound on producers and items per producer.
pub const MAX_PIPELINE_DIMENSION: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate a config document.
///
/// `$env{VAR}` references are expanded before parsing. An empty document
/// yields the defaults.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let config: Config = if yaml_string.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml_string)?
    };

    validate_config(&config)?;
    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=<value>\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_pipeline(&config.pipeline, &mut errors);

    if config.counter.tasks > MAX_PIPELINE_DIMENSION {
        errors.push(format!(
            "counter.tasks must be at most {} (got {})",
            MAX_PIPELINE_DIMENSION, config.counter.tasks
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

/// Number of values a full run emits, or `None` if it does not fit in `u64`.
pub fn pipeline_total(producer_count: usize, items_per_producer: usize) -> Option<u64> {
    u64::try_from(producer_count)
        .ok()?
        .checked_mul(u64::try_from(items_per_producer).ok()?)
}

fn validate_pipeline(pipeline: &PipelineConfig, errors: &mut Vec<String>) {
    if pipeline.channel_capacity == 0 {
        errors.push("pipeline.channel_capacity must be at least 1".to_string());
    }

    if pipeline.producer_count > MAX_PIPELINE_DIMENSION {
        errors.push(format!(
            "pipeline.producer_count must be at most {} (got {})",
            MAX_PIPELINE_DIMENSION, pipeline.producer_count
        ));
    }

    if pipeline.items_per_producer > MAX_PIPELINE_DIMENSION {
        errors.push(format!(
            "pipeline.items_per_producer must be at most {} (got {})",
            MAX_PIPELINE_DIMENSION, pipeline.items_per_producer
        ));
    }

    if pipeline_total(pipeline.producer_count, pipeline.items_per_producer).is_none() {
        errors.push(format!(
            "pipeline.producer_count * pipeline.items_per_producer overflows u64 ({} * {})",
            pipeline.producer_count, pipeline.items_per_producer
        ));
    }

    if let Some(deadline) = pipeline.deadline {
        if deadline.is_zero() {
            errors.push("pipeline.deadline must be greater than zero (use 'infinite' to disable)".to_string());
        }
    }
}
