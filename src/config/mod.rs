// src/config/mod.rs

//! Pipeline definitions loaded from TOML.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk (`loader.rs`).
//! - Validate references and dependency order (`validate.rs`).
//!
//! The result converts into a [`crate::pipeline::Pipeline`] via
//! [`ConfigFile::to_pipeline`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{ConfigFile, PipelineSection, RawConfigFile, TargetConfig};
pub use validate::validate_raw_config;
