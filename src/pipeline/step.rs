// src/pipeline/step.rs

//! Steps: the opaque side effects a target runs in order.
//!
//! A [`Step`] is either a plain closure ([`Step::Action`]) or an object
//! implementing [`Callable`] ([`Step::Object`]). Both are invoked through
//! [`Step::invoke`], and both report failure as a [`StepFailure`] value
//! rather than by panicking.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{StepFailure, StepResult};

/// Boxed, sendable future returned by [`Callable::call`].
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = StepResult> + Send + 'a>>;

/// Object-style step: anything with a zero-argument `call`.
pub trait Callable: Send + Sync {
    fn call(&self) -> StepFuture<'_>;

    /// Short human-readable description used in logs and dry runs.
    fn describe(&self) -> String {
        "<callable>".to_string()
    }
}

type ActionFn = dyn Fn() -> StepResult + Send + Sync;

pub enum Step {
    /// A synchronous closure.
    Action(Box<ActionFn>),
    /// A [`Callable`] object, possibly asynchronous.
    Object(Box<dyn Callable>),
}

impl Step {
    pub fn action<F>(f: F) -> Self
    where
        F: Fn() -> StepResult + Send + Sync + 'static,
    {
        Step::Action(Box::new(f))
    }

    pub fn object<C>(callable: C) -> Self
    where
        C: Callable + 'static,
    {
        Step::Object(Box::new(callable))
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self::object(ShellStep::new(command))
    }

    /// Run the step's side effect.
    pub async fn invoke(&self) -> StepResult {
        match self {
            Step::Action(f) => f(),
            Step::Object(callable) => callable.call().await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Step::Action(_) => "<action>".to_string(),
            Step::Object(callable) => callable.describe(),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Step").field(&self.describe()).finish()
    }
}

/// Runs a shell command; a non-zero exit status fails the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellStep {
    command: String,
}

impl ShellStep {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn run(&self) -> StepResult {
        info!(cmd = %self.command, "running shell step");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let status = cmd.status().await.map_err(|e| {
            StepFailure::new(format!("spawning process for '{}': {e}", self.command))
        })?;

        let code = status.code().unwrap_or(-1);
        debug!(cmd = %self.command, exit_code = code, "shell step exited");

        if status.success() {
            Ok(())
        } else {
            Err(StepFailure::new(format!(
                "command '{}' exited with code {code}",
                self.command
            )))
        }
    }
}

impl Callable for ShellStep {
    fn call(&self) -> StepFuture<'_> {
        Box::pin(self.run())
    }

    fn describe(&self) -> String {
        self.command.clone()
    }
}
