use std::sync::Arc;

use lte_core::{PolicyKind, UlCqiFilter};

/// Bandwidths allowed by 36.101, in RBs
pub const VALID_BANDWIDTHS: [u8; 6] = [6, 15, 25, 50, 75, 100];

/// Static cell parameters. When present, the scheduler starts with the cell configured.
#[derive(Debug, Clone)]
pub struct CfgCell {
    /// Downlink bandwidth in RBs
    pub dl_bandwidth: u8,
    /// Uplink bandwidth in RBs
    pub ul_bandwidth: u8,
}

impl Default for CfgCell {
    fn default() -> Self {
        Self {
            dl_bandwidth: 25,
            ul_bandwidth: 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedConfig {
    pub debug_log: Option<String>,

    /// Flow selection metric for both directions
    pub policy: PolicyKind,

    /// With HARQ disabled, feedback is discarded and every grant uses process 0
    pub harq_enabled: bool,

    /// CQI reports expire after this many TTIs without refresh
    pub cqi_timer_threshold: u32,

    /// MCS used for random access response grants
    pub ul_grant_mcs: u8,

    pub ul_cqi_filter: UlCqiFilter,

    /// Averaging window in TTIs of the proportional fair throughput estimate
    pub pf_time_window: f64,

    pub cell: Option<CfgCell>,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            debug_log: None,
            policy: PolicyKind::RoundRobin,
            harq_enabled: true,
            cqi_timer_threshold: default_cqi_timer_threshold(),
            ul_grant_mcs: 0,
            ul_cqi_filter: UlCqiFilter::Srs,
            pf_time_window: default_pf_time_window(),
            cell: None,
        }
    }
}

#[inline]
fn default_cqi_timer_threshold() -> u32 {
    1000
}

#[inline]
fn default_pf_time_window() -> f64 {
    99.0
}

impl SchedConfig {
    pub fn new(policy: PolicyKind) -> Self {
        SchedConfig {
            policy,
            ..Default::default()
        }
    }

    /// Validate that all configuration fields hold usable values.
    pub fn validate(&self) -> Result<(), &str> {
        if self.cqi_timer_threshold == 0 {
            return Err("cqi_timer_threshold must be at least 1");
        }
        if self.ul_grant_mcs > lte_core::amc::MAX_MCS {
            return Err("ul_grant_mcs must be in 0..=28");
        }
        if self.pf_time_window.is_nan() || self.pf_time_window < 1.0 {
            return Err("pf_time_window must be at least 1.0");
        }
        if let Some(ref cell) = self.cell {
            if !VALID_BANDWIDTHS.contains(&cell.dl_bandwidth) {
                return Err("cell dl_bandwidth must be one of 6, 15, 25, 50, 75, 100");
            }
            if !VALID_BANDWIDTHS.contains(&cell.ul_bandwidth) {
                return Err("cell ul_bandwidth must be one of 6, 15, 25, 50, 75, 100");
            }
        }
        Ok(())
    }
}

/// Global shared configuration, immutable after construction
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<SchedConfig>,
}

impl SharedConfig {
    pub fn new(policy: PolicyKind) -> Self {
        Self::from_config(SchedConfig::new(policy))
    }

    pub fn from_config(cfg: SchedConfig) -> Self {
        // Check config for validity before returning the SharedConfig object
        match cfg.validate() {
            Ok(_) => {}
            Err(e) => panic!("Invalid scheduler configuration: {}", e),
        }

        Self {
            cfg: Arc::new(cfg),
        }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<SchedConfig> {
        Arc::clone(&self.cfg)
    }
}
