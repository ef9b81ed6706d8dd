// src/pipeline/model.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result, TorchbearError};
use crate::event::{EventRouter, Status};
use crate::pipeline::target::{Schedulable, TargetHandler};

/// A validated set of targets plus the default entry point.
///
/// The pipeline owns no queue; it only wires target mailboxes into an
/// [`EventRouter`] and seeds the run. Targets keep their mailboxes and
/// one-shot state, so a pipeline can be run once.
#[derive(Debug)]
pub struct Pipeline {
    targets: Vec<Arc<dyn Schedulable>>,
    default_target: Arc<dyn Schedulable>,
    ran: AtomicBool,
}

impl Pipeline {
    /// Build a pipeline, rejecting duplicate target ids.
    ///
    /// Every dependency must be one of `targets` (the same instance, not just
    /// the same id); otherwise its events would never be routed.
    /// `default_target` defaults to the last target in `targets`.
    pub fn new(targets: Vec<Arc<dyn Schedulable>>, default_target: Option<&str>) -> Result<Self> {
        let mut ids = HashSet::new();
        for target in &targets {
            if !ids.insert(target.id()) {
                return Err(TorchbearError::DuplicateTarget(target.id().to_string()));
            }
        }

        // Membership of direct dependencies covers the transitive closure,
        // since every member is checked in turn.
        for target in &targets {
            for dep in target.dependencies() {
                if !targets.iter().any(|t| Arc::ptr_eq(t, dep)) {
                    return Err(TorchbearError::UnknownDependency {
                        target: target.id().to_string(),
                        dependency: dep.id().to_string(),
                    });
                }
            }
        }

        let default_target = match default_target {
            Some(name) => targets
                .iter()
                .find(|t| t.id() == name)
                .cloned()
                .ok_or_else(|| TorchbearError::UnknownTarget(name.to_string()))?,
            None => targets.last().cloned().ok_or(TorchbearError::EmptyPipeline)?,
        };

        Ok(Self {
            targets,
            default_target,
            ran: AtomicBool::new(false),
        })
    }

    /// Pipeline holding `target` alone. Its dependencies, if any, are not
    /// members, so use [`Pipeline::new`] for dependent targets.
    pub fn for_one_target(target: Arc<dyn Schedulable>) -> Result<Self> {
        Self::new(vec![target], None)
    }

    pub fn targets(&self) -> &[Arc<dyn Schedulable>] {
        &self.targets
    }

    pub fn default_target(&self) -> &Arc<dyn Schedulable> {
        &self.default_target
    }

    pub fn target(&self, id: &str) -> Option<&Arc<dyn Schedulable>> {
        self.targets.iter().find(|t| t.id() == id)
    }

    /// Subscribe every target with `router`, collecting their handler loops.
    pub fn subscribe(&self, router: &mut EventRouter) -> Vec<TargetHandler> {
        self.targets
            .iter()
            .map(|target| Arc::clone(target).subscribe(router))
            .collect()
    }

    /// Trigger `target` (or the default target) and run until it terminates.
    ///
    /// The router and every target handler run concurrently; once the chosen
    /// target reports a terminal status the router closes all mailboxes and
    /// the handlers wind down.
    ///
    /// A pipeline runs at most once: mailboxes are closed and targets stay
    /// finished afterwards, so a second call fails with
    /// [`TorchbearError::AlreadyRun`]. Build a fresh pipeline to run again.
    pub async fn run(&self, mut router: EventRouter, target: Option<&str>) -> Result<Status> {
        let root = match target {
            Some(name) => self
                .target(name)
                .ok_or_else(|| TorchbearError::UnknownTarget(name.to_string()))?,
            None => &self.default_target,
        };

        if self.ran.swap(true, Ordering::SeqCst) {
            return Err(TorchbearError::AlreadyRun);
        }

        let handlers = self.subscribe(&mut router);
        info!(target_id = %root.id(), targets = handlers.len(), "running pipeline");

        let mut tasks = JoinSet::new();
        for handler in handlers {
            tasks.spawn(handler.run());
        }

        let outcome = match root.trigger(router.inbound()) {
            Ok(()) => router.run(root.status_id()).await,
            Err(err) => {
                router.close();
                Err(err)
            }
        };

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "target handler task failed");
                return Err(Error::from(err).into());
            }
        }

        debug!(target_id = %root.id(), ?outcome, "pipeline run finished");
        outcome
    }
}
