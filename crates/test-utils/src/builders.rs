#![allow(dead_code)]

use std::collections::BTreeMap;
use torchbear::config::{ConfigFile, PipelineSection, RawConfigFile, TargetConfig};
use torchbear::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection::default(),
                target: BTreeMap::new(),
            },
        }
    }

    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.config.target.insert(name.to_string(), target);
        self
    }

    pub fn with_default(mut self, name: &str) -> Self {
        self.config.pipeline.default = Some(name.to_string());
        self
    }

    /// Validate without panicking, for tests that expect an error.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new() -> Self {
        Self {
            target: TargetConfig {
                steps: vec![],
                after: vec![],
            },
        }
    }

    pub fn step(mut self, cmd: &str) -> Self {
        self.target.steps.push(cmd.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.target.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}

impl Default for TargetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
