// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod logging;
pub mod pipeline;
pub mod runner;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::errors::Result;
use crate::event::{EventRouter, Status};
use crate::pipeline::{Pipeline, Schedulable};

pub use crate::event::{Event, EventId, EventQueue};
pub use crate::pipeline::{DependentTarget, PipelineBuilder, Step, Target};
pub use crate::runner::run_pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and pipeline construction
/// - the event router and target handlers
/// - Ctrl-C handling
///
/// Returns the terminal status of the chosen target. A dry run only prints
/// the pipeline and reports `Succeeded`.
pub async fn run(args: CliArgs) -> Result<Status> {
    let cfg = load_and_validate(&args.config)?;
    let pipeline = cfg.to_pipeline()?;

    if args.dry_run {
        print_dry_run(&pipeline);
        return Ok(Status::Succeeded);
    }

    let router = EventRouter::default();

    // Ctrl-C → close the inbound queue; the router then winds everything down.
    let interrupt = {
        let inbound = Arc::clone(router.inbound());
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("interrupt received; stopping pipeline");
            inbound.close();
        })
    };

    let outcome = pipeline.run(router, args.target.as_deref()).await;
    interrupt.abort();
    outcome
}

/// Simple dry-run output: print targets, dependencies and steps.
fn print_dry_run(pipeline: &Pipeline) {
    println!("torchbear dry-run");
    println!("  default target = {}", pipeline.default_target().id());
    println!();

    println!("targets ({}):", pipeline.targets().len());
    for target in pipeline.targets() {
        println!("  - {}", target.id());
        let deps: Vec<&str> = target.dependencies().iter().map(|d| d.id()).collect();
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        for step in target.base().steps() {
            println!("      step: {}", step.describe());
        }
    }

    debug!("dry-run complete (no execution)");
}
