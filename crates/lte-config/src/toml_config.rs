use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use lte_core::{PolicyKind, UlCqiFilter};
use serde::Deserialize;
use toml::Value;

use super::sched_config::{CfgCell, SchedConfig, SharedConfig};

/// Build `SharedConfig` from a TOML configuration file
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref sched) = root.scheduler {
        if !sched.extra.is_empty() {
            return Err(format!("Unrecognized fields in scheduler: {:?}", sorted_keys(&sched.extra)).into());
        }
    }
    if let Some(ref cell) = root.cell {
        if !cell.extra.is_empty() {
            return Err(format!("Unrecognized fields in cell: {:?}", sorted_keys(&cell.extra)).into());
        }
    }

    // Build config from required and optional values
    let mut cfg = SchedConfig {
        debug_log: root.debug_log,
        ..Default::default()
    };

    if let Some(sched) = root.scheduler {
        apply_scheduler_patch(&mut cfg, sched);
    }

    if let Some(cell) = root.cell {
        cfg.cell = Some(CfgCell {
            dl_bandwidth: cell.dl_bandwidth,
            ul_bandwidth: cell.ul_bandwidth,
        });
    }

    // Report invalid values as an error rather than letting SharedConfig panic on them
    cfg.validate().map_err(|e| e.to_string())?;

    Ok(SharedConfig::from_config(cfg))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_scheduler_patch(dst: &mut SchedConfig, src: SchedulerDto) {
    if let Some(v) = src.policy {
        dst.policy = v;
    }
    if let Some(v) = src.harq_enabled {
        dst.harq_enabled = v;
    }
    if let Some(v) = src.cqi_timer_threshold {
        dst.cqi_timer_threshold = v;
    }
    if let Some(v) = src.ul_grant_mcs {
        dst.ul_grant_mcs = v;
    }
    if let Some(v) = src.ul_cqi_filter {
        dst.ul_cqi_filter = v;
    }
    if let Some(v) = src.pf_time_window {
        dst.pf_time_window = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    #[serde(default)]
    debug_log: Option<String>,

    #[serde(default)]
    scheduler: Option<SchedulerDto>,

    #[serde(default)]
    cell: Option<CellDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct SchedulerDto {
    #[serde(default)]
    policy: Option<PolicyKind>,
    #[serde(default)]
    harq_enabled: Option<bool>,
    #[serde(default)]
    cqi_timer_threshold: Option<u32>,
    #[serde(default)]
    ul_grant_mcs: Option<u8>,
    #[serde(default)]
    ul_cqi_filter: Option<UlCqiFilter>,
    #[serde(default)]
    pf_time_window: Option<f64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct CellDto {
    dl_bandwidth: u8,
    ul_bandwidth: u8,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
