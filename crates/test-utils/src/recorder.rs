use std::sync::{Arc, Mutex};

use torchbear::errors::StepFailure;
use torchbear::pipeline::Step;

/// Shared string sink that steps append to, so tests can assert on what ran
/// and in which order.
#[derive(Debug, Clone, Default)]
pub struct Output {
    buf: Arc<Mutex<String>>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, s: &str) {
        self.buf.lock().unwrap().push_str(s);
    }

    pub fn value(&self) -> String {
        self.buf.lock().unwrap().clone()
    }

    /// A step that appends `s` and succeeds.
    pub fn write_step(&self, s: &str) -> Step {
        let out = self.clone();
        let s = s.to_string();
        Step::action(move || {
            out.write(&s);
            Ok(())
        })
    }

    /// A step that appends `s` and then fails.
    pub fn failing_step(&self, s: &str) -> Step {
        let out = self.clone();
        let s = s.to_string();
        Step::action(move || {
            out.write(&s);
            Err(StepFailure::new(format!("{s} failed")))
        })
    }
}

/// A step that fails without side effects.
pub fn fail_step() -> Step {
    Step::action(|| Err(StepFailure::new("boom")))
}
