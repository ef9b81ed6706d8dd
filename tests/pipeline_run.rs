// tests/pipeline_run.rs

use std::error::Error;
use std::sync::Arc;

use torchbear::errors::TorchbearError;
use torchbear::event::{Event, EventId, EventQueue, EventRouter, Status};
use torchbear::pipeline::{DependentTarget, Pipeline, PipelineBuilder, Schedulable, Target};
use torchbear::run_pipeline;
use torchbear_test_utils::recorder::{Output, fail_step};
use torchbear_test_utils::{drain, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// `foo_target` writes "foo"; `bar_target` runs after it and writes "bar".
fn foobar(output: &Output) -> Result<Pipeline, TorchbearError> {
    let mut builder = PipelineBuilder::new();
    let foo = builder
        .target("foo_target")
        .step(output.write_step("foo"))
        .add();
    builder
        .dependent_target("bar_target")
        .after(&foo)
        .step(output.write_step("bar"))
        .add();
    builder.build()
}

#[tokio::test]
async fn dependency_runs_before_dependent() -> TestResult {
    init_tracing();

    let output = Output::new();
    let pipeline = foobar(&output)?;
    assert_eq!(pipeline.default_target().id(), "bar_target");

    // Observe the inbound stream by subscribing a spare mailbox to both
    // status ids.
    let mut router = EventRouter::default();
    let observed = Arc::new(EventQueue::new());
    router.add_subscription(EventId::status("foo_target"), Arc::clone(&observed));
    router.add_subscription(EventId::status("bar_target"), Arc::clone(&observed));

    let status = with_timeout(pipeline.run(router, Some("bar_target"))).await?;

    assert_eq!(status, Status::Succeeded);
    assert_eq!(output.value(), "foobar");

    assert_eq!(
        drain(&observed).await,
        vec![
            Event::with_value(EventId::status("foo_target"), Status::Succeeded),
            Event::with_value(EventId::status("bar_target"), Status::Succeeded),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn duplicate_target_ids_are_rejected() -> TestResult {
    let err = Pipeline::new(
        vec![
            Arc::new(Target::new("foo", vec![])),
            Arc::new(Target::new("foo", vec![])),
        ],
        None,
    )
    .unwrap_err();

    assert!(matches!(err, TorchbearError::DuplicateTarget(ref id) if id == "foo"));
    assert_eq!(err.to_string(), "Duplicate target id \"foo\".");
    Ok(())
}

#[tokio::test]
async fn empty_pipeline_is_rejected() -> TestResult {
    let err = PipelineBuilder::new().build().unwrap_err();
    assert!(matches!(err, TorchbearError::EmptyPipeline));
    Ok(())
}

#[tokio::test]
async fn unknown_default_target_is_rejected() -> TestResult {
    let mut builder = PipelineBuilder::new();
    builder.target("a").add();
    builder.default_target("missing");

    let err = builder.build().unwrap_err();
    assert!(matches!(err, TorchbearError::UnknownTarget(ref id) if id == "missing"));
    Ok(())
}

#[tokio::test]
async fn running_unknown_target_is_an_error() -> TestResult {
    init_tracing();

    let pipeline = foobar(&Output::new())?;
    let err = run_pipeline(&pipeline, Some("nope")).await.unwrap_err();
    assert!(matches!(err, TorchbearError::UnknownTarget(ref id) if id == "nope"));
    Ok(())
}

#[tokio::test]
async fn dependency_failure_fails_the_root_without_running_it() -> TestResult {
    init_tracing();

    let output = Output::new();
    let mut builder = PipelineBuilder::new();
    let broken = builder.target("broken").step(fail_step()).add();
    builder
        .target("after_broken")
        .after(&broken)
        .step(output.write_step("never"))
        .add();
    let pipeline = builder.build()?;

    let status = with_timeout(run_pipeline(&pipeline, None)).await?;

    assert_eq!(status, Status::Failed);
    assert_eq!(output.value(), "");
    Ok(())
}

#[tokio::test]
async fn failure_propagates_through_a_chain() -> TestResult {
    init_tracing();

    let output = Output::new();
    let mut builder = PipelineBuilder::new();
    let a = builder.target("a").step(output.failing_step("a")).add();
    let b = builder.target("b").after(&a).step(output.write_step("b")).add();
    builder.target("c").after(&b).step(output.write_step("c")).add();
    let pipeline = builder.build()?;

    let status = with_timeout(run_pipeline(&pipeline, Some("c"))).await?;

    assert_eq!(status, Status::Failed);
    assert_eq!(output.value(), "a");
    Ok(())
}

#[tokio::test]
async fn shared_dependency_runs_once_in_a_diamond() -> TestResult {
    init_tracing();

    let output = Output::new();
    let mut builder = PipelineBuilder::new();
    let base = builder.target("base").step(output.write_step("base;")).add();
    let left = builder.target("left").after(&base).step(output.write_step("left;")).add();
    let right = builder
        .target("right")
        .after(&base)
        .step(output.write_step("right;"))
        .add();
    builder
        .target("top")
        .after(&left)
        .after(&right)
        .step(output.write_step("top"))
        .add();
    let pipeline = builder.build()?;

    let status = with_timeout(run_pipeline(&pipeline, None)).await?;
    assert_eq!(status, Status::Succeeded);

    let out = output.value();
    assert!(out.starts_with("base;"));
    assert!(out.ends_with("top"));
    assert_eq!(out.matches("base;").count(), 1);
    assert!(out.contains("left;") && out.contains("right;"));
    Ok(())
}

#[tokio::test]
async fn running_a_dependency_alone_leaves_dependents_idle() -> TestResult {
    init_tracing();

    let output = Output::new();
    let pipeline = foobar(&output)?;

    let status = with_timeout(run_pipeline(&pipeline, Some("foo_target"))).await?;

    assert_eq!(status, Status::Succeeded);
    assert_eq!(output.value(), "foo");
    Ok(())
}

#[tokio::test]
async fn subscribe_returns_one_handler_per_target() -> TestResult {
    let pipeline = foobar(&Output::new())?;
    let mut router = EventRouter::default();

    let handlers = pipeline.subscribe(&mut router);
    let ids: Vec<&str> = handlers.iter().map(|h| h.target_id()).collect();

    assert_eq!(ids, vec!["foo_target", "bar_target"]);
    // foo_target's status is watched by bar_target only.
    assert_eq!(router.subscriber_count(&EventId::status("foo_target")), 1);
    assert!(pipeline.target("bar_target").is_some());
    Ok(())
}

#[tokio::test]
async fn dependency_outside_the_pipeline_is_rejected() -> TestResult {
    let outsider: Arc<dyn Schedulable> = Arc::new(Target::new("dep", vec![]));
    let root: Arc<dyn Schedulable> =
        Arc::new(DependentTarget::new("root", vec![], vec![outsider]));

    let err = Pipeline::new(vec![root], None).unwrap_err();

    assert!(matches!(
        err,
        TorchbearError::UnknownDependency { ref target, ref dependency }
            if target == "root" && dependency == "dep"
    ));
    Ok(())
}

#[tokio::test]
async fn dependency_sharing_a_member_id_is_rejected() -> TestResult {
    let member: Arc<dyn Schedulable> = Arc::new(Target::new("dep", vec![]));
    let lookalike: Arc<dyn Schedulable> = Arc::new(Target::new("dep", vec![]));
    let root: Arc<dyn Schedulable> =
        Arc::new(DependentTarget::new("root", vec![], vec![lookalike]));

    let err = Pipeline::new(vec![member, root], None).unwrap_err();
    assert!(matches!(err, TorchbearError::UnknownDependency { .. }));
    Ok(())
}

#[tokio::test]
async fn pipeline_runs_only_once() -> TestResult {
    init_tracing();

    let output = Output::new();
    let pipeline = foobar(&output)?;

    // A bad target name does not use up the run.
    assert!(run_pipeline(&pipeline, Some("nope")).await.is_err());

    let first = with_timeout(run_pipeline(&pipeline, None)).await?;
    assert_eq!(first, Status::Succeeded);

    let err = with_timeout(run_pipeline(&pipeline, None)).await.unwrap_err();
    assert!(matches!(err, TorchbearError::AlreadyRun));
    assert_eq!(output.value(), "foobar");
    Ok(())
}
