pub mod builders;
pub mod recorder;

use std::sync::Once;

use torchbear::event::{Event, EventQueue};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or with `-- --nocapture`). Filter with `RUST_LOG`, e.g.
/// `RUST_LOG=torchbear::event=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking after 5 seconds.
///
/// A run whose root target never terminates would otherwise hang the test.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Collect every event from `queue` until it is closed and empty.
///
/// Callers must make sure the queue gets closed (the router closes every
/// subscribed mailbox when a run ends).
pub async fn drain(queue: &EventQueue) -> Vec<Event> {
    let mut events = queue.produce();
    let mut received = Vec::new();
    while let Some(event) = events.next().await {
        received.push(event);
    }
    received
}
