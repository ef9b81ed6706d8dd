// src/pipeline/target.rs

//! Target state machine and the handler loop that drives it.
//!
//! Every target owns a mailbox. [`Schedulable::subscribe`] registers that
//! mailbox with the router and returns a [`TargetHandler`], whose `run` loop
//! feeds each delivered event into [`Schedulable::start`] and forwards the
//! resulting events back into the router's inbound queue.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::event::{Event, EventId, EventQueue, EventRouter, Item, Status, TargetId};
use crate::pipeline::step::Step;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Destination for the events a target produces while handling one event.
pub trait EventSink: Send {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Sink that publishes into the router's inbound queue.
///
/// Once the queue is closed (the run is winding down) emitted events are
/// dropped instead of failing the handler.
#[derive(Debug)]
pub struct Forwarder<'a> {
    queue: &'a EventQueue,
    target: &'a str,
}

impl<'a> Forwarder<'a> {
    pub fn new(queue: &'a EventQueue, target: &'a str) -> Self {
        Self { queue, target }
    }
}

impl EventSink for Forwarder<'_> {
    fn emit(&mut self, event: Event) {
        if let Err(err) = self.queue.send([event]) {
            debug!(target_id = %self.target, error = %err, "inbound queue closed; dropping emitted event");
        }
    }
}

/// Anything the pipeline can subscribe, trigger and start.
pub trait Schedulable: Send + Sync + fmt::Debug {
    /// The plain target carrying identity, steps and mailbox.
    fn base(&self) -> &Target;

    /// Event ids whose events should land in this target's mailbox.
    fn subscriptions(&self) -> Vec<EventId>;

    /// Register the mailbox with `router` and return the handler loop.
    fn subscribe(self: Arc<Self>, router: &mut EventRouter) -> TargetHandler;

    /// Publish the start request(s) for this target into `queue`.
    fn trigger(&self, queue: &EventQueue) -> Result<()>;

    /// React to one delivered event, emitting any resulting events.
    fn start<'a>(&'a self, event: &'a Event, sink: &'a mut dyn EventSink) -> BoxFuture<'a, ()>;

    fn dependencies(&self) -> &[Arc<dyn Schedulable>] {
        &[]
    }

    fn id(&self) -> &str {
        self.base().id()
    }

    fn start_id(&self) -> &EventId {
        self.base().start_id()
    }

    fn status_id(&self) -> &EventId {
        self.base().status_id()
    }

    fn start_item(&self) -> Item {
        (self.start_id().clone(), None)
    }

    fn success_item(&self) -> Item {
        (self.status_id().clone(), Some(Status::Succeeded))
    }

    fn failure_item(&self) -> Item {
        (self.status_id().clone(), Some(Status::Failed))
    }
}

/// A named, ordered list of steps with a one-shot status lifecycle.
pub struct Target {
    id: TargetId,
    start_id: EventId,
    status_id: EventId,
    steps: Vec<Step>,
    mailbox: Arc<EventQueue>,
    started: AtomicBool,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Target {
    pub fn new(id: impl Into<TargetId>, steps: Vec<Step>) -> Self {
        let id = id.into();
        Self {
            start_id: EventId::start(id.clone()),
            status_id: EventId::status(id.clone()),
            id,
            steps,
            mailbox: Arc::new(EventQueue::new()),
            started: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_id(&self) -> &EventId {
        &self.start_id
    }

    pub fn status_id(&self) -> &EventId {
        &self.status_id
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mailbox(&self) -> &Arc<EventQueue> {
        &self.mailbox
    }

    pub fn status_event(&self, status: Status) -> Event {
        Event::with_value(self.status_id.clone(), status)
    }

    /// Run the steps in order, unless they have already been run.
    ///
    /// Emits a running event before each step and exactly one status event
    /// at the end. The first failing step ends the run with `Failed`.
    /// Returns the emitted status, or `None` if this target already ran.
    pub async fn run_once(&self, sink: &mut dyn EventSink) -> Option<Status> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!(target_id = %self.id, "steps already started; ignoring");
            return None;
        }

        info!(target_id = %self.id, steps = self.steps.len(), "starting target");

        for (index, step) in self.steps.iter().enumerate() {
            sink.emit(Event::with_value(
                EventId::step_running(self.id.clone(), index),
                Status::Running,
            ));
            debug!(target_id = %self.id, step = index, desc = %step.describe(), "running step");

            if let Err(failure) = step.invoke().await {
                warn!(target_id = %self.id, step = index, error = %failure, "step failed");
                sink.emit(self.status_event(Status::Failed));
                return Some(Status::Failed);
            }
        }

        info!(target_id = %self.id, "target succeeded");
        sink.emit(self.status_event(Status::Succeeded));
        Some(Status::Succeeded)
    }
}

impl Schedulable for Target {
    fn base(&self) -> &Target {
        self
    }

    fn subscriptions(&self) -> Vec<EventId> {
        vec![self.start_id.clone()]
    }

    fn subscribe(self: Arc<Self>, router: &mut EventRouter) -> TargetHandler {
        TargetHandler::register(self, router)
    }

    fn trigger(&self, queue: &EventQueue) -> Result<()> {
        debug!(target_id = %self.id, "triggering target");
        queue.send([Event::new(self.start_id.clone())])
    }

    fn start<'a>(&'a self, event: &'a Event, sink: &'a mut dyn EventSink) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if event.id() != &self.start_id {
                debug!(target_id = %self.id, %event, "ignoring non-start event");
                return;
            }
            self.run_once(sink).await;
        })
    }
}

/// Handler loop consuming one target's mailbox.
pub struct TargetHandler {
    target: Arc<dyn Schedulable>,
    outbound: Arc<EventQueue>,
}

impl fmt::Debug for TargetHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandler")
            .field("target", &self.target.id())
            .finish_non_exhaustive()
    }
}

impl TargetHandler {
    /// Subscribe `target`'s mailbox to every id it listens to.
    pub fn register(target: Arc<dyn Schedulable>, router: &mut EventRouter) -> Self {
        let mailbox = target.base().mailbox();
        for id in target.subscriptions() {
            router.add_subscription(id, Arc::clone(mailbox));
        }

        Self {
            outbound: Arc::clone(router.inbound()),
            target,
        }
    }

    pub fn target_id(&self) -> &str {
        self.target.id()
    }

    /// Consume the mailbox until it is closed and drained.
    pub async fn run(self) {
        let mailbox = Arc::clone(self.target.base().mailbox());
        let mut events = mailbox.produce();

        while let Some(event) = events.next().await {
            debug!(target_id = %self.target.id(), %event, "target received event");
            let mut sink = Forwarder::new(&self.outbound, self.target.id());

            // A panicking step must still end the target, otherwise nothing
            // ever reports its status and the run cannot terminate.
            let handled = AssertUnwindSafe(self.target.start(&event, &mut sink))
                .catch_unwind()
                .await;
            if let Err(panic) = handled {
                error!(
                    target_id = %self.target.id(),
                    panic = %panic_message(panic.as_ref()),
                    "target panicked; reporting failure"
                );
                sink.emit(self.target.base().status_event(Status::Failed));
            }
        }

        debug!(target_id = %self.target.id(), "target handler finished");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
