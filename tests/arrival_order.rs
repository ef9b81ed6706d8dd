// tests/arrival_order.rs

//! The outcome of a dependent target must not depend on the order in which
//! its start request and its dependencies' statuses arrive.

use std::sync::Arc;

use proptest::prelude::*;
use torchbear::event::{Event, EventId, Status};
use torchbear::pipeline::{DependentTarget, Schedulable, Target};
use torchbear_test_utils::recorder::Output;

/// Dependency outcomes (`true` = succeeded) plus a shuffled delivery order.
/// Index `n` in the order stands for the start request.
fn arrivals(max_deps: usize) -> impl Strategy<Value = (Vec<bool>, Vec<usize>)> {
    proptest::collection::vec(any::<bool>(), 0..=max_deps).prop_flat_map(|outcomes| {
        let order: Vec<usize> = (0..=outcomes.len()).collect();
        (Just(outcomes), Just(order).prop_shuffle())
    })
}

fn dep_name(i: usize) -> String {
    format!("dep_{i}")
}

proptest! {
    #[test]
    fn outcome_is_independent_of_arrival_order((outcomes, order) in arrivals(4)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");

        let output = Output::new();
        let deps: Vec<Arc<dyn Schedulable>> = (0..outcomes.len())
            .map(|i| Arc::new(Target::new(dep_name(i), vec![])) as Arc<dyn Schedulable>)
            .collect();
        let target = DependentTarget::new("root", vec![output.write_step("ran")], deps);

        let n = outcomes.len();
        let mut emitted = Vec::new();
        let mut delivered_start = false;
        let mut delivered_failure = false;
        let mut delivered = 0;

        for &index in &order {
            let event = if index == n {
                delivered_start = true;
                Event::new(EventId::start("root"))
            } else {
                let status = if outcomes[index] { Status::Succeeded } else { Status::Failed };
                delivered_failure |= status == Status::Failed;
                Event::with_value(EventId::status(dep_name(index)), status)
            };
            delivered += 1;

            let before = emitted.len();
            rt.block_on(target.start(&event, &mut emitted));

            // Nothing happens until the start request and enough statuses
            // to decide have arrived.
            if emitted.len() > before {
                prop_assert!(delivered_start);
                prop_assert!(delivered_failure || delivered == n + 1);
            }
        }

        let statuses: Vec<&Event> = emitted
            .iter()
            .filter(|e| e.id() == &EventId::status("root"))
            .collect();
        prop_assert_eq!(statuses.len(), 1);

        let expected = if outcomes.iter().all(|ok| *ok) {
            Status::Succeeded
        } else {
            Status::Failed
        };
        prop_assert_eq!(statuses[0].value(), Some(expected));
        prop_assert_eq!(output.value().is_empty(), expected == Status::Failed);
    }
}
