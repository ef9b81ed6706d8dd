// src/pipeline/mod.rs

//! Targets, steps and the pipeline that wires them together.
//!
//! - [`step`] holds the [`Step`] capability and the shell-backed [`ShellStep`].
//! - [`target`] is the plain [`Target`] state machine and its handler loop.
//! - [`dependent`] adds [`DependentTarget`], gated on other targets' status.
//! - [`model`] is the validated [`Pipeline`].
//! - [`builder`] provides explicit construction via [`PipelineBuilder`].

pub mod builder;
pub mod dependent;
pub mod model;
pub mod step;
pub mod target;

pub use builder::{PipelineBuilder, TargetBuilder};
pub use dependent::DependentTarget;
pub use model::Pipeline;
pub use step::{Callable, ShellStep, Step, StepFuture};
pub use target::{BoxFuture, EventSink, Forwarder, Schedulable, Target, TargetHandler};
