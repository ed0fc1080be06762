use lte_core::{Lcid, Rnti, TxMode};

use crate::fields::lc_config::LogicalChannelConfig;

/// (Re)configures the cell. Bandwidths in RBs.
#[derive(Debug, Clone)]
pub struct CschedCellConfigReq {
    pub dl_bandwidth: u8,
    pub ul_bandwidth: u8,
}

/// Adds a UE, or updates its transmission mode
#[derive(Debug, Clone)]
pub struct CschedUeConfigReq {
    pub rnti: Rnti,
    pub tx_mode: TxMode,
}

#[derive(Debug, Clone)]
pub struct CschedLcConfigReq {
    pub rnti: Rnti,
    pub lc_list: Vec<LogicalChannelConfig>,
}

#[derive(Debug, Clone)]
pub struct CschedLcReleaseReq {
    pub rnti: Rnti,
    pub lcids: Vec<Lcid>,
}

#[derive(Debug, Clone)]
pub struct CschedUeReleaseReq {
    pub rnti: Rnti,
}
