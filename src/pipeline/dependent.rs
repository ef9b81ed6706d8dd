// src/pipeline/dependent.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::Result;
use crate::event::{Event, EventId, EventQueue, EventRouter, Item, Status, TargetId};
use crate::pipeline::step::Step;
use crate::pipeline::target::{BoxFuture, EventSink, Schedulable, Target, TargetHandler};

/// Last observed value per event id.
type SeenMap = HashMap<EventId, Option<Status>>;

fn has_seen(seen: &SeenMap, (id, value): &Item) -> bool {
    seen.get(id) == Some(value)
}

/// A target gated on the terminal status of its dependencies.
///
/// Every delivered event is folded into `seen`, and the decision to run is
/// taken from that accumulated history alone:
/// - already terminal: ignore;
/// - never asked to start: wait;
/// - any dependency failed: emit own failure without running steps;
/// - any dependency not yet succeeded: wait;
/// - otherwise run the steps.
///
/// This makes the outcome independent of the order in which the start
/// request and the dependency statuses arrive.
pub struct DependentTarget {
    base: Target,
    dependencies: Vec<Arc<dyn Schedulable>>,
    seen: Mutex<SeenMap>,
}

impl fmt::Debug for DependentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deps: Vec<&str> = self.dependencies.iter().map(|d| d.id()).collect();
        f.debug_struct("DependentTarget")
            .field("base", &self.base)
            .field("dependencies", &deps)
            .finish_non_exhaustive()
    }
}

impl DependentTarget {
    pub fn new(
        id: impl Into<TargetId>,
        steps: Vec<Step>,
        dependencies: Vec<Arc<dyn Schedulable>>,
    ) -> Self {
        Self {
            base: Target::new(id, steps),
            dependencies,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `item` is the last value recorded for its id.
    pub async fn has_seen(&self, item: &Item) -> bool {
        has_seen(&*self.seen.lock().await, item)
    }

    async fn handle(&self, event: &Event, sink: &mut dyn EventSink) {
        let id = self.base.id();
        let mut seen = self.seen.lock().await;
        seen.insert(event.id().clone(), event.value());

        if has_seen(&seen, &self.failure_item()) || has_seen(&seen, &self.success_item()) {
            debug!(target_id = %id, %event, "target already finished; ignoring");
            return;
        }

        if !has_seen(&seen, &self.start_item()) {
            debug!(target_id = %id, %event, "target not triggered yet; waiting");
            return;
        }

        if let Some(failed) = self
            .dependencies
            .iter()
            .find(|dep| has_seen(&seen, &dep.failure_item()))
        {
            info!(target_id = %id, dependency = %failed.id(), "dependency failed; failing target");
            let (status_id, value) = self.failure_item();
            seen.insert(status_id, value);
            sink.emit(self.base.status_event(Status::Failed));
            return;
        }

        if let Some(pending) = self
            .dependencies
            .iter()
            .find(|dep| !has_seen(&seen, &dep.success_item()))
        {
            debug!(target_id = %id, waiting_on = %pending.id(), "dependencies not yet satisfied");
            return;
        }

        // Record the outcome right away so that events arriving before our
        // own status event comes back through the router see us as finished.
        if let Some(status) = self.base.run_once(sink).await {
            seen.insert(self.base.status_id().clone(), Some(status));
        }
    }
}

impl Schedulable for DependentTarget {
    fn base(&self) -> &Target {
        &self.base
    }

    /// Own start id, every dependency's status id, and own status id.
    fn subscriptions(&self) -> Vec<EventId> {
        let mut ids = vec![self.base.start_id().clone()];
        ids.extend(self.dependencies.iter().map(|dep| dep.status_id().clone()));
        ids.push(self.base.status_id().clone());
        ids
    }

    fn subscribe(self: Arc<Self>, router: &mut EventRouter) -> TargetHandler {
        TargetHandler::register(self, router)
    }

    /// Trigger this target, then every dependency transitively.
    fn trigger(&self, queue: &EventQueue) -> Result<()> {
        self.base.trigger(queue)?;
        for dep in &self.dependencies {
            dep.trigger(queue)?;
        }
        Ok(())
    }

    fn start<'a>(&'a self, event: &'a Event, sink: &'a mut dyn EventSink) -> BoxFuture<'a, ()> {
        Box::pin(self.handle(event, sink))
    }

    fn dependencies(&self) -> &[Arc<dyn Schedulable>] {
        &self.dependencies
    }
}
