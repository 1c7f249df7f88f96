use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::store::DEFAULT_HISTORY_CAP;

const DEFAULT_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    model: Option<ModelConfigFile>,
    history: Option<HistoryConfigFile>,
    monitor: Option<LoopConfigFile>,
    simulation: Option<SimulationConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct HistoryConfigFile {
    cap: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct LoopConfigFile {
    interval_secs: Option<u64>,
    image: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SimulationConfigFile {
    seed: Option<u64>,
}

/// Monitor configuration: JSON file (selected by `TALLY_CONFIG`) layered
/// under env-var overrides.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// ONNX model location. `None` selects the simulation path outright.
    pub model_path: Option<PathBuf>,
    /// Retained-history bound for the aggregation store.
    pub history_cap: usize,
    /// Detection cycle period for the daemon loop.
    pub interval: Duration,
    /// Frame source for the daemon loop. `None` drives simulated frames.
    pub image_path: Option<PathBuf>,
    /// Fixed seed for the simulated source; entropy-seeded when unset.
    pub simulation_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            history_cap: DEFAULT_HISTORY_CAP,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            image_path: None,
            simulation_seed: None,
        }
    }
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TALLY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        Self {
            model_path: file.model.and_then(|model| model.path),
            history_cap: file
                .history
                .and_then(|history| history.cap)
                .unwrap_or(DEFAULT_HISTORY_CAP),
            interval: Duration::from_secs(
                file.monitor
                    .as_ref()
                    .and_then(|monitor| monitor.interval_secs)
                    .unwrap_or(DEFAULT_INTERVAL_SECS),
            ),
            image_path: file.monitor.and_then(|monitor| monitor.image),
            simulation_seed: file.simulation.and_then(|simulation| simulation.seed),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("TALLY_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(cap) = std::env::var("TALLY_HISTORY_CAP") {
            let cap: usize = cap
                .parse()
                .map_err(|_| anyhow!("TALLY_HISTORY_CAP must be an integer"))?;
            self.history_cap = cap;
        }
        if let Ok(secs) = std::env::var("TALLY_INTERVAL_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| anyhow!("TALLY_INTERVAL_SECS must be an integer number of seconds"))?;
            self.interval = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("TALLY_IMAGE") {
            if !path.trim().is_empty() {
                self.image_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(seed) = std::env::var("TALLY_SIM_SEED") {
            let seed: u64 = seed
                .parse()
                .map_err(|_| anyhow!("TALLY_SIM_SEED must be an integer"))?;
            self.simulation_seed = Some(seed);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.history_cap == 0 {
            return Err(anyhow!("history cap must be greater than zero"));
        }
        if self.interval.as_secs() == 0 {
            return Err(anyhow!("monitor interval must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
