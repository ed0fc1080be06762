use std::collections::BTreeMap;

use lte_core::{Direction, FlowId, PolicyKind};

use super::{FlowCandidate, FlowSelectionPolicy, FlowStats, TtiSummary, argmax_by};

/// Average throughput of a flow that never got anything, keeps the metric finite
const INITIAL_AVG_THROUGHPUT: f64 = 1.0;

/// Duration of a TTI in seconds
const TTI_SECONDS: f64 = 0.001;

/// Picks the flow with the best ratio of achievable rate to average past throughput
pub struct ProportionalFair {
    dir: Direction,
    /// Averaging window in TTIs
    time_window: f64,
    flows: BTreeMap<FlowId, FlowStats>,
}

impl ProportionalFair {
    pub fn new(dir: Direction, time_window: f64) -> Self {
        Self {
            dir,
            time_window,
            flows: BTreeMap::new(),
        }
    }

    fn avg_throughput(&self, flow: FlowId) -> f64 {
        self.flows.get(&flow).map_or(INITIAL_AVG_THROUGHPUT, |s| s.avg_throughput)
    }
}

impl FlowSelectionPolicy for ProportionalFair {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ProportionalFair
    }

    fn register_flow(&mut self, flow: FlowId) {
        self.flows.entry(flow).or_insert(FlowStats {
            avg_throughput: INITIAL_AVG_THROUGHPUT,
            ..Default::default()
        });
    }

    fn release_flow(&mut self, flow: FlowId) {
        self.flows.remove(&flow);
    }

    fn select_next(&mut self, candidates: &[FlowCandidate], unit: usize) -> Option<FlowId> {
        let selected = argmax_by(candidates, |c| c.achievable_rate / self.avg_throughput(c.flow));
        tracing::trace!("{} pf unit {} -> {:?}", self.dir, unit, selected);
        selected
    }

    fn end_tti(&mut self, summary: &TtiSummary) {
        let alpha = 1.0 / self.time_window;
        for (flow, stats) in self.flows.iter_mut() {
            let bytes = summary.bytes.get(flow).copied().unwrap_or(0);
            stats.last_tti_bytes = bytes;
            stats.total_bytes += bytes as u64;
            stats.avg_throughput = (1.0 - alpha) * stats.avg_throughput + alpha * (bytes as f64 / TTI_SECONDS);
            if bytes > 0 {
                tracing::debug!("{} pf {} got {} bytes, avg {:.0} B/s", self.dir, flow, bytes, stats.avg_throughput);
            }
        }
    }

    fn flow_stats(&self, flow: FlowId) -> Option<FlowStats> {
        self.flows.get(&flow).copied()
    }
}
