//! Flow selection policies shared by the DL and UL allocation engines.
//!
//! The engines walk the free resource units of a TTI one at a time and ask the policy
//! which of the eligible flows gets the unit. Candidates are always handed over in
//! (RNTI, LCID) order, so policies that break ties towards the first candidate are
//! reproducible.

use std::collections::BTreeMap;

use lte_core::{Direction, FlowId, PolicyKind};

pub mod mt;
pub mod pf;
pub mod priority;
pub mod rr;

pub use mt::MaxThroughput;
pub use pf::ProportionalFair;
pub use priority::Priority;
pub use rr::RoundRobin;

/// A flow eligible for the resource unit being allocated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCandidate {
    pub flow: FlowId,
    /// Bytes per second the flow would get from this unit alone, summed over layers
    pub achievable_rate: f64,
}

/// Outcome of the allocation of one TTI, reported to the policy once the TTI is committed
#[derive(Debug, Clone, Default)]
pub struct TtiSummary {
    /// Bytes committed per flow
    pub bytes: BTreeMap<FlowId, u32>,
    /// Flow that received the last allocated unit, and whether it ended up satisfied
    pub last: Option<(FlowId, bool)>,
    /// The last flow received every unit of the TTI
    pub last_held_all: bool,
}

/// Throughput statistics kept by policies that track them
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowStats {
    pub total_bytes: u64,
    pub last_tti_bytes: u32,
    /// Average throughput in bytes per second
    pub avg_throughput: f64,
}

pub trait FlowSelectionPolicy: Send {
    fn kind(&self) -> PolicyKind;

    /// A flow becomes known, called when its logical channel or UE is configured
    fn register_flow(&mut self, _flow: FlowId) {}

    /// A flow is gone, called when its logical channel or UE is released
    fn release_flow(&mut self, _flow: FlowId) {}

    /// QCI of the bearer behind a flow, reported when its logical channel is configured
    fn set_qci(&mut self, _flow: FlowId, _qci: u8) {}

    /// Picks the flow receiving resource unit `unit`. `candidates` is sorted by flow.
    fn select_next(&mut self, candidates: &[FlowCandidate], unit: usize) -> Option<FlowId>;

    /// Called after `flow` was given `unit`
    fn on_assigned(&mut self, _flow: FlowId, _unit: usize, _satisfied: bool) {}

    /// Called once per TTI after the allocation is committed
    fn end_tti(&mut self, _summary: &TtiSummary) {}

    fn flow_stats(&self, _flow: FlowId) -> Option<FlowStats> {
        None
    }
}

/// Creates the policy for one direction
pub fn new_policy(kind: PolicyKind, dir: Direction, pf_time_window: f64) -> Box<dyn FlowSelectionPolicy> {
    tracing::debug!("{} flow selection policy {:?}", dir, kind);
    match kind {
        PolicyKind::RoundRobin => Box::new(RoundRobin::new(dir)),
        PolicyKind::ProportionalFair => Box::new(ProportionalFair::new(dir, pf_time_window)),
        PolicyKind::MaxThroughput => Box::new(MaxThroughput::new(dir)),
        PolicyKind::Priority => Box::new(Priority::new(dir)),
    }
}

/// First candidate with the strictly highest metric
fn argmax_by<F>(candidates: &[FlowCandidate], metric: F) -> Option<FlowId>
where
    F: Fn(&FlowCandidate) -> f64,
{
    let mut best: Option<(FlowId, f64)> = None;
    for c in candidates {
        let m = metric(c);
        if best.is_none_or(|(_, b)| m > b) {
            best = Some((c.flow, m));
        }
    }
    best.map(|(flow, _)| flow)
}
