// tests/event_queue.rs

use std::error::Error;
use std::sync::Arc;

use tokio::time::{Duration, sleep};

use torchbear::errors::TorchbearError;
use torchbear::event::{Event, EventId, EventQueue, Status};
use torchbear_test_utils::{drain, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn start(target: &str) -> Event {
    Event::new(EventId::start(target))
}

#[tokio::test]
async fn events_come_out_in_send_order() -> TestResult {
    init_tracing();

    let queue = EventQueue::new();
    queue.send([start("a"), start("b")])?;
    queue.send([Event::with_value(EventId::status("a"), Status::Succeeded)])?;
    queue.close();

    assert_eq!(
        with_timeout(drain(&queue)).await,
        vec![
            start("a"),
            start("b"),
            Event::with_value(EventId::status("a"), Status::Succeeded),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn send_after_close_is_rejected() -> TestResult {
    init_tracing();

    let queue = EventQueue::new();
    queue.close();

    let err = queue.send([start("a")]).unwrap_err();
    assert!(matches!(err, TorchbearError::QueueClosed));
    assert!(queue.is_empty());
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent() -> TestResult {
    init_tracing();

    let queue = EventQueue::new();
    queue.close();
    queue.close();

    assert!(queue.is_closed());
    assert!(queue.produce().next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn buffered_events_are_drained_after_close() -> TestResult {
    init_tracing();

    let queue = EventQueue::new();
    queue.send([start("a"), start("b")])?;
    queue.close();
    assert_eq!(queue.len(), 2);

    let mut events = queue.produce();
    assert_eq!(events.next().await, Some(start("a")));
    assert_eq!(events.next().await, Some(start("b")));
    assert_eq!(events.next().await, None);
    Ok(())
}

#[tokio::test]
async fn consumer_waits_until_an_event_arrives() -> TestResult {
    init_tracing();

    let queue = Arc::new(EventQueue::new());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { drain(&queue).await })
    };

    sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished());

    queue.send([start("late")])?;
    sleep(Duration::from_millis(20)).await;
    queue.send([start("later")])?;
    queue.close();

    let received = with_timeout(consumer).await?;
    assert_eq!(received, vec![start("late"), start("later")]);
    Ok(())
}

#[tokio::test]
async fn close_wakes_an_idle_consumer() -> TestResult {
    init_tracing();

    let queue = Arc::new(EventQueue::new());
    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.produce().next().await })
    };

    sleep(Duration::from_millis(20)).await;
    queue.close();

    assert_eq!(with_timeout(consumer).await?, None);
    Ok(())
}
