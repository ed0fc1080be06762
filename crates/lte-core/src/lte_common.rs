use core::fmt;

use serde::Deserialize;


/// Service access points between the scheduler and its users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sap {
    /// Configuration side: cell, UE and logical channel (re)configuration
    CschedSap,
    /// Per-TTI side: reports, triggers and resulting grants
    SchedSap,
}

/// Radio Network Temporary Identifier
pub type Rnti = u16;
/// Logical channel identity
pub type Lcid = u8;

/// Number of parallel HARQ processes per UE per direction
pub const HARQ_PROC_NUM: u8 = 8;
/// DL HARQ processes without feedback for this many TTIs are force-reset
pub const HARQ_DL_TIMEOUT: u8 = 11;
/// Distance in TTIs between an UL transmission and its HARQ feedback
pub const HARQ_PERIOD: u8 = 7;
/// A HARQ process is dropped once this many transmissions have failed
pub const HARQ_MAX_TX: u8 = 3;
/// Sentinel returned when no HARQ process is free
pub const HARQ_ID_INVALID: u8 = HARQ_PROC_NUM + 1;

/// Placeholder for RBs without UL SINR measurement
pub const NO_SINR: f64 = -5000.0;

/// A (RNTI, LCID) pair. Ordering is by RNTI first, then LCID, which is the
/// iteration order every selection policy relies on for reproducible tie-breaks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId {
    pub rnti: Rnti,
    pub lcid: Lcid,
}

impl FlowId {
    pub fn new(rnti: Rnti, lcid: Lcid) -> Self {
        FlowId { rnti, lcid }
    }

    /// Uplink flows are per UE, since buffer status reports are aggregated over LCGs
    pub fn ue(rnti: Rnti) -> Self {
        FlowId { rnti, lcid: 0 }
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rnti, self.lcid)
    }
}

impl fmt::Debug for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rnti, self.lcid)
    }
}

/// Flow selection metric used by both allocation engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PolicyKind {
    RoundRobin,
    ProportionalFair,
    MaxThroughput,
    /// Strict priority by bearer QCI
    Priority,
}

/// Which UL CQI reports are taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum UlCqiFilter {
    Srs,
    Pusch,
    All,
}

/// Transmission modes, numbered from 0 (SISO) as in the FF MAC API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    Siso = 0,
    TxDiversity = 1,
    SpatialMuxOpenLoop = 2,
    SpatialMuxClosedLoop = 3,
    MultiUserMimo = 4,
    ClosedLoopRank1 = 5,
    SinglePortPort5 = 6,
}

impl TxMode {
    pub fn from_raw(raw: u8) -> Option<TxMode> {
        match raw {
            0 => Some(TxMode::Siso),
            1 => Some(TxMode::TxDiversity),
            2 => Some(TxMode::SpatialMuxOpenLoop),
            3 => Some(TxMode::SpatialMuxClosedLoop),
            4 => Some(TxMode::MultiUserMimo),
            5 => Some(TxMode::ClosedLoopRank1),
            6 => Some(TxMode::SinglePortPort5),
            _ => None,
        }
    }

    pub fn into_raw(self) -> u8 {
        self as u8
    }

    /// Number of spatial layers (transport blocks) used with this mode
    pub fn num_layers(self) -> usize {
        match self {
            TxMode::SpatialMuxOpenLoop | TxMode::SpatialMuxClosedLoop | TxMode::MultiUserMimo => 2,
            _ => 1,
        }
    }
}
