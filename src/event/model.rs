// src/event/model.rs

use std::fmt;

/// Canonical target identifier used throughout the engine.
pub type TargetId = String;

/// Lifecycle status carried as an event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Running,
    Failed,
    Succeeded,
}

impl Status {
    /// `Failed` and `Succeeded` are the only completion states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Failed | Status::Succeeded)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Failed => "failed",
            Status::Succeeded => "succeeded",
        };
        f.write_str(s)
    }
}

/// Role tag distinguishing the events a single target is involved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Request to start the target.
    Start,
    /// Terminal status of the target.
    Status,
    /// Observability signal emitted before the step at this index runs.
    StepRunning(usize),
}

/// Key an event is routed and remembered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId {
    target: TargetId,
    role: Role,
}

impl EventId {
    pub fn new(target: impl Into<TargetId>, role: Role) -> Self {
        Self {
            target: target.into(),
            role,
        }
    }

    pub fn start(target: impl Into<TargetId>) -> Self {
        Self::new(target, Role::Start)
    }

    pub fn status(target: impl Into<TargetId>) -> Self {
        Self::new(target, Role::Status)
    }

    pub fn step_running(target: impl Into<TargetId>, index: usize) -> Self {
        Self::new(target, Role::StepRunning(index))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Start => write!(f, "({}, start)", self.target),
            Role::Status => write!(f, "({}, status)", self.target),
            Role::StepRunning(index) => write!(f, "({}, step, {index}, running)", self.target),
        }
    }
}

/// The `(id, value)` pair used for "have I seen this" bookkeeping.
pub type Item = (EventId, Option<Status>);

/// Immutable notification flowing through queues and the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    id: EventId,
    value: Option<Status>,
}

impl Event {
    /// Event without payload (e.g. a start request).
    pub fn new(id: EventId) -> Self {
        Self { id, value: None }
    }

    pub fn with_value(id: EventId, value: Status) -> Self {
        Self {
            id,
            value: Some(value),
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn value(&self) -> Option<Status> {
        self.value
    }

    pub fn item(&self) -> Item {
        (self.id.clone(), self.value)
    }

    /// True if this event reports a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.value.is_some_and(Status::is_terminal)
    }
}

impl From<Item> for Event {
    fn from((id, value): Item) -> Self {
        Self { id, value }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}={}", self.id, value),
            None => write!(f, "{}", self.id),
        }
    }
}
