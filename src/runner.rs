// src/runner.rs

//! Run a built pipeline to completion with a fresh router.

use crate::errors::Result;
use crate::event::{EventRouter, Status};
use crate::pipeline::Pipeline;

/// Execute `pipeline` from `target` (or its default target).
///
/// Returns the chosen target's terminal status. Step failures anywhere in
/// its dependency closure surface as `Ok(Status::Failed)`, not as errors.
/// A pipeline can only be run once; a second call returns
/// [`TorchbearError::AlreadyRun`](crate::errors::TorchbearError::AlreadyRun).
pub async fn run_pipeline(pipeline: &Pipeline, target: Option<&str>) -> Result<Status> {
    pipeline.run(EventRouter::default(), target).await
}
