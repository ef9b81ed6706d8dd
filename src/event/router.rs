// src/event/router.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{Result, TorchbearError};
use crate::event::{EventId, EventQueue, Status};

/// Fans events from one inbound queue out to subscribed target mailboxes.
///
/// The router is the only component that closes mailboxes: once the root
/// target reports a terminal status, every subscribed mailbox and then the
/// inbound queue are closed, which unblocks every target handler.
pub struct EventRouter {
    inbound: Arc<EventQueue>,
    subscriptions: HashMap<EventId, Vec<Arc<EventQueue>>>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(Arc::new(EventQueue::new()))
    }
}

impl EventRouter {
    pub fn new(inbound: Arc<EventQueue>) -> Self {
        Self {
            inbound,
            subscriptions: HashMap::new(),
        }
    }

    /// Shared handle to the inbound queue targets publish into.
    pub fn inbound(&self) -> &Arc<EventQueue> {
        &self.inbound
    }

    /// Deliver every event with this id to `queue`.
    ///
    /// Registrations are not deduplicated: registering the same queue twice
    /// delivers each matching event twice.
    pub fn add_subscription(&mut self, id: EventId, queue: Arc<EventQueue>) {
        debug!(event_id = %id, "adding subscription");
        self.subscriptions.entry(id).or_default().push(queue);
    }

    /// Ids that currently have at least one subscriber.
    pub fn subscribed_ids(&self) -> impl Iterator<Item = &EventId> {
        self.subscriptions.keys()
    }

    /// Number of mailboxes registered for `id`, counting duplicates.
    pub fn subscriber_count(&self, id: &EventId) -> usize {
        self.subscriptions.get(id).map_or(0, Vec::len)
    }

    /// Route inbound events until `root_status` carries a terminal value.
    ///
    /// The terminating event is still delivered to its subscribers before the
    /// run ends. Returns the root's terminal status, or
    /// [`TorchbearError::Interrupted`] if the inbound queue was closed first.
    pub async fn run(&self, root_status: &EventId) -> Result<Status> {
        info!(root = %root_status, "event router started");

        let outcome = self.route_until_terminal(root_status).await;
        self.close();

        match &outcome {
            Ok(status) => info!(root = %root_status, %status, "event router finished"),
            Err(err) => warn!(root = %root_status, error = %err, "event router stopped"),
        }
        outcome
    }

    async fn route_until_terminal(&self, root_status: &EventId) -> Result<Status> {
        let mut events = self.inbound.produce();

        while let Some(event) = events.next().await {
            debug!(%event, "routing event");

            let finished = match event.value() {
                Some(status) if status.is_terminal() && event.id() == root_status => {
                    Some(status)
                }
                _ => None,
            };

            if let Some(queues) = self.subscriptions.get(event.id()) {
                for queue in queues {
                    queue.send([event.clone()])?;
                }
            }

            if let Some(status) = finished {
                return Ok(status);
            }
        }

        Err(TorchbearError::Interrupted)
    }

    /// Close every subscribed mailbox, then the inbound queue.
    pub fn close(&self) {
        for queues in self.subscriptions.values() {
            for queue in queues {
                queue.close();
            }
        }
        self.inbound.close();
    }
}
