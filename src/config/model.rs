// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Pipeline definition as read from a TOML file, before validation.
///
/// ```toml
/// [pipeline]
/// default = "bar"
///
/// [target.foo]
/// steps = ["echo foo", "ls -l"]
///
/// [target.bar]
/// steps = ["echo bar"]
/// after = ["foo"]
/// ```
///
/// All sections are optional at the TOML level; validation insists on at
/// least one target.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Pipeline-wide settings from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// All targets from `[target.<name>]`, keyed by target id.
    #[serde(default)]
    pub target: BTreeMap<String, TargetConfig>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineSection {
    /// Target run when none is named on the command line.
    ///
    /// If unset, the last target in dependency order is used.
    #[serde(default)]
    pub default: Option<String>,
}

/// `[target.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetConfig {
    /// Shell commands run in order; the first failure fails the target.
    #[serde(default)]
    pub steps: Vec<String>,

    /// Targets that must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A validated pipeline definition.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, which guarantees that
/// every `after` reference resolves, there are no cycles, and `order` lists
/// every target after all of its dependencies.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub target: BTreeMap<String, TargetConfig>,
    order: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        target: BTreeMap<String, TargetConfig>,
        order: Vec<String>,
    ) -> Self {
        Self {
            pipeline,
            target,
            order,
        }
    }

    /// Target ids in dependency order (dependencies first).
    pub fn order(&self) -> &[String] {
        &self.order
    }
}
