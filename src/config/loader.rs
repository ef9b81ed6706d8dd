// src/config/loader.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TorchbearError};
use crate::pipeline::{Pipeline, PipelineBuilder, Schedulable};

/// Load a pipeline definition and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a pipeline definition from `path` and validate it.
///
/// - Reads TOML.
/// - Checks for unknown or self `after` references, an unknown
///   `[pipeline].default`, and dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Parse and validate a definition held in memory.
pub fn parse_and_validate(contents: &str) -> Result<ConfigFile> {
    let raw_config: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw_config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("torchbear.toml")
}

impl ConfigFile {
    /// Build the runnable pipeline described by this config.
    ///
    /// Targets with a non-empty `after` list become dependent targets; every
    /// step string becomes a shell step. Targets are added in dependency
    /// order, so the default falls back to the last of them.
    pub fn to_pipeline(&self) -> Result<Pipeline> {
        let mut builder = PipelineBuilder::new();
        let mut built: HashMap<&str, Arc<dyn Schedulable>> = HashMap::new();

        for name in self.order() {
            let cfg = self.target.get(name).ok_or_else(|| {
                TorchbearError::ConfigError(format!("target '{name}' missing from config"))
            })?;

            let mut target = if cfg.after.is_empty() {
                builder.target(name.clone())
            } else {
                builder.dependent_target(name.clone())
            };

            for dep in &cfg.after {
                let dep = built
                    .get(dep.as_str())
                    .ok_or_else(|| TorchbearError::UnknownTarget(dep.clone()))?;
                target = target.after(dep);
            }

            for command in &cfg.steps {
                target = target.shell(command.clone());
            }

            debug!(target_id = %name, deps = ?cfg.after, steps = cfg.steps.len(), "built target from config");
            built.insert(name.as_str(), target.add());
        }

        if let Some(ref default) = self.pipeline.default {
            builder.default_target(default.clone());
        }

        builder.build()
    }
}
