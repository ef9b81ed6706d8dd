// src/event/queue.rs

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::errors::{Result, TorchbearError};
use crate::event::Event;

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<Event>,
    closed: bool,
}

/// FIFO mailbox of events with async "wait until non-empty" semantics.
///
/// Semantics:
/// - `send` appends to the tail and wakes any waiting consumer.
/// - `produce` returns a [`Producer`] that suspends while the queue is empty
///   and open, and drains every buffered event in one batch on resumption.
/// - `close` is idempotent. Sends after close fail with
///   [`TorchbearError::QueueClosed`], but events buffered before close are
///   still handed to the consumer before the producer ends.
///
/// Each event is consumed exactly once, so one queue per consumer is
/// expected.
#[derive(Debug, Default)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    ready: Notify,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation leaves `QueueState` consistent, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append events to the tail of the queue.
    ///
    /// It is valid to send into a queue while it is being consumed.
    pub fn send<I>(&self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut state = self.lock();
        if state.closed {
            return Err(TorchbearError::QueueClosed);
        }

        let was_empty = state.events.is_empty();
        state.events.extend(events);
        let woke = was_empty && !state.events.is_empty();
        drop(state);

        if woke {
            self.ready.notify_waiters();
        }
        Ok(())
    }

    /// Close the queue and wake any waiting consumer.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            trace!(buffered = state.events.len(), "event queue closed");
        }
        drop(state);
        self.ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Start consuming this queue.
    pub fn produce(&self) -> Producer<'_> {
        Producer {
            queue: self,
            batch: VecDeque::new(),
        }
    }

    /// Wait for the next batch of buffered events.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    async fn next_batch(&self) -> Option<VecDeque<Event>> {
        loop {
            // Register interest before inspecting state so a concurrent
            // `send`/`close` cannot slip between the check and the wait.
            let notified = self.ready.notified();
            {
                let mut state = self.lock();
                if !state.events.is_empty() {
                    return Some(std::mem::take(&mut state.events));
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }
}

/// Consuming view of an [`EventQueue`], yielding events in arrival order.
#[derive(Debug)]
pub struct Producer<'a> {
    queue: &'a EventQueue,
    batch: VecDeque<Event>,
}

impl Producer<'_> {
    /// Next event, suspending while the queue is empty and open.
    pub async fn next(&mut self) -> Option<Event> {
        if self.batch.is_empty() {
            self.batch = self.queue.next_batch().await?;
            debug!(drained = self.batch.len(), "event queue resumed");
        }
        self.batch.pop_front()
    }
}
