// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TorchbearError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TorchbearError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let order = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pipeline, raw.target, order))
    }
}

/// Validate `cfg` and return its targets in dependency order.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<Vec<String>> {
    ensure_has_targets(cfg)?;
    validate_target_dependencies(cfg)?;
    validate_default_target(cfg)?;
    dependency_order(cfg)
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.target.is_empty() {
        return Err(TorchbearError::ConfigError(
            "config must contain at least one [target.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_target_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, target) in cfg.target.iter() {
        for dep in target.after.iter() {
            if !cfg.target.contains_key(dep) {
                return Err(TorchbearError::ConfigError(format!(
                    "target '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(TorchbearError::ConfigError(format!(
                    "target '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    match cfg.pipeline.default {
        Some(ref name) if !cfg.target.contains_key(name) => Err(TorchbearError::ConfigError(
            format!("[pipeline].default names unknown target '{}'", name),
        )),
        _ => Ok(()),
    }
}

/// Topologically sort the targets so each comes after its dependencies.
///
/// The in-memory pipeline cannot express a cycle (a target needs its
/// dependencies to exist before it is built), so a cyclic definition is
/// rejected here.
fn dependency_order(cfg: &RawConfigFile) -> Result<Vec<String>> {
    // Edge direction: dep -> target
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.target.keys() {
        graph.add_node(name.as_str());
    }

    for (name, target) in cfg.target.iter() {
        for dep in target.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(TorchbearError::DagCycle(format!(
            "cycle detected in target graph involving target '{}'",
            cycle.node_id()
        ))),
    }
}
