// src/event/mod.rs

//! Event plumbing for the scheduling engine.
//!
//! - [`model`] defines the immutable [`Event`] and its [`EventId`] / [`Status`].
//! - [`queue`] is the per-consumer FIFO mailbox with async wake-up.
//! - [`router`] fans inbound events out to subscribed mailboxes and decides
//!   when a pipeline run is over.

pub mod model;
pub mod queue;
pub mod router;

pub use model::{Event, EventId, Item, Role, Status, TargetId};
pub use queue::{EventQueue, Producer};
pub use router::EventRouter;
