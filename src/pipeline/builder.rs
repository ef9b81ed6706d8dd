// src/pipeline/builder.rs

//! Explicit, scope-free pipeline construction.
//!
//! ```no_run
//! use torchbear::pipeline::{PipelineBuilder, Step};
//!
//! # fn main() -> torchbear::errors::Result<()> {
//! let mut builder = PipelineBuilder::new();
//! let shelly = builder
//!     .target("Shelly")
//!     .step(Step::shell("echo foo"))
//!     .step(Step::shell("ls -l"))
//!     .add();
//! builder
//!     .dependent_target("Nopy")
//!     .after(&shelly)
//!     .step(Step::shell("echo steve"))
//!     .add();
//! let pipeline = builder.build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::errors::{Result, StepResult};
use crate::event::TargetId;
use crate::pipeline::dependent::DependentTarget;
use crate::pipeline::model::Pipeline;
use crate::pipeline::step::Step;
use crate::pipeline::target::{Schedulable, Target};

/// Collects targets in declaration order, then validates them into a
/// [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    targets: Vec<Arc<dyn Schedulable>>,
    default_target: Option<TargetId>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a plain target.
    pub fn target(&mut self, id: impl Into<TargetId>) -> TargetBuilder<'_> {
        TargetBuilder::new(self, id.into(), false)
    }

    /// Start declaring a target gated on other targets.
    pub fn dependent_target(&mut self, id: impl Into<TargetId>) -> TargetBuilder<'_> {
        TargetBuilder::new(self, id.into(), true)
    }

    /// Register an already-constructed target.
    pub fn push(&mut self, target: Arc<dyn Schedulable>) -> Arc<dyn Schedulable> {
        self.targets.push(Arc::clone(&target));
        target
    }

    /// Entry point used when no explicit target is requested.
    pub fn default_target(&mut self, id: impl Into<TargetId>) -> &mut Self {
        self.default_target = Some(id.into());
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.targets, self.default_target.as_deref())
    }
}

/// Declares one target; [`TargetBuilder::add`] registers it with the
/// owning [`PipelineBuilder`].
#[derive(Debug)]
pub struct TargetBuilder<'a> {
    pipeline: &'a mut PipelineBuilder,
    id: TargetId,
    dependent: bool,
    steps: Vec<Step>,
    dependencies: Vec<Arc<dyn Schedulable>>,
}

impl<'a> TargetBuilder<'a> {
    fn new(pipeline: &'a mut PipelineBuilder, id: TargetId, dependent: bool) -> Self {
        Self {
            pipeline,
            id,
            dependent,
            steps: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn action<F>(self, f: F) -> Self
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        self.step(Step::action(f))
    }

    pub fn shell(self, command: impl Into<String>) -> Self {
        self.step(Step::shell(command))
    }

    /// Gate this target on `dependency`. Implies a dependent target.
    pub fn after(mut self, dependency: &Arc<dyn Schedulable>) -> Self {
        self.dependent = true;
        self.dependencies.push(Arc::clone(dependency));
        self
    }

    pub fn add(self) -> Arc<dyn Schedulable> {
        let target: Arc<dyn Schedulable> = if self.dependent {
            Arc::new(DependentTarget::new(self.id, self.steps, self.dependencies))
        } else {
            Arc::new(Target::new(self.id, self.steps))
        };
        self.pipeline.push(target)
    }
}
