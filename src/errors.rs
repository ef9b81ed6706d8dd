// src/errors.rs

//! Crate-wide error types.
//!
//! - [`TorchbearError`] covers pipeline construction, mailbox misuse and the
//!   outer adapters (config loading, IO).
//! - [`StepFailure`] is what a step returns when its side effect fails. It
//!   never crosses the target boundary: the target turns it into a `FAILED`
//!   status event.

use thiserror::Error;

use crate::event::TargetId;

#[derive(Error, Debug)]
pub enum TorchbearError {
    #[error("Duplicate target id \"{0}\".")]
    DuplicateTarget(TargetId),

    #[error("Queue is closed")]
    QueueClosed,

    #[error("Target not found: {0}")]
    UnknownTarget(TargetId),

    #[error("Pipeline must contain at least one target")]
    EmptyPipeline,

    #[error("Target \"{target}\" depends on \"{dependency}\", which is not part of the pipeline")]
    UnknownDependency {
        target: TargetId,
        dependency: TargetId,
    },

    #[error("Pipeline has already been run")]
    AlreadyRun,

    #[error("Pipeline run interrupted before the target finished")]
    Interrupted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in target graph: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TorchbearError>;

/// Failure raised by a step's side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step failed: {message}")]
pub struct StepFailure {
    message: String,
}

impl StepFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl From<std::io::Error> for StepFailure {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of invoking a single step.
pub type StepResult = std::result::Result<(), StepFailure>;
