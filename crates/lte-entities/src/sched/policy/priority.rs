use std::collections::BTreeMap;

use lte_core::{Direction, FlowId, PolicyKind};

use super::{FlowCandidate, FlowSelectionPolicy};

/// QCI assumed until a flow's logical channel configuration is known
pub const DEFAULT_QCI: u8 = 9;

/// Priority level of a standardized QCI, 1 is served first. Unknown QCIs come last.
pub fn qci_priority(qci: u8) -> u8 {
    match qci {
        1 => 2,
        2 => 4,
        3 => 3,
        4 => 5,
        5 => 1,
        6..=9 => qci,
        _ => 10,
    }
}

/// Strict priority by bearer QCI. Among flows of the same priority level the first
/// candidate wins, the achievable rate is not looked at.
pub struct Priority {
    dir: Direction,
    priorities: BTreeMap<FlowId, u8>,
}

impl Priority {
    pub fn new(dir: Direction) -> Self {
        Self { dir, priorities: BTreeMap::new() }
    }

    fn priority(&self, flow: FlowId) -> u8 {
        self.priorities.get(&flow).copied().unwrap_or(qci_priority(DEFAULT_QCI))
    }
}

impl FlowSelectionPolicy for Priority {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Priority
    }

    fn register_flow(&mut self, flow: FlowId) {
        self.priorities.entry(flow).or_insert(qci_priority(DEFAULT_QCI));
    }

    fn release_flow(&mut self, flow: FlowId) {
        self.priorities.remove(&flow);
    }

    fn set_qci(&mut self, flow: FlowId, qci: u8) {
        tracing::trace!("{} flow {} qci {} priority {}", self.dir, flow, qci, qci_priority(qci));
        self.priorities.insert(flow, qci_priority(qci));
    }

    fn select_next(&mut self, candidates: &[FlowCandidate], unit: usize) -> Option<FlowId> {
        // min_by_key keeps the first of equal elements
        let selected = candidates.iter().min_by_key(|c| self.priority(c.flow)).map(|c| c.flow);
        tracing::trace!("{} priority unit {} -> {:?}", self.dir, unit, selected);
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(rnti: u16, rate: f64) -> FlowCandidate {
        FlowCandidate { flow: FlowId::new(rnti, 3), achievable_rate: rate }
    }

    #[test]
    fn test_qci_priority_order() {
        let order: Vec<u8> = {
            let mut qcis: Vec<u8> = (1..=9).collect();
            qcis.sort_by_key(|&q| qci_priority(q));
            qcis
        };
        assert_eq!(order, vec![5, 1, 3, 2, 4, 6, 7, 8, 9]);
        assert_eq!(qci_priority(0), 10);
        assert_eq!(qci_priority(70), 10);
    }

    #[test]
    fn test_priority_ignores_rate() {
        let mut p = Priority::new(Direction::Dl);
        for rnti in 1..=3 {
            p.register_flow(FlowId::new(rnti, 3));
        }
        p.set_qci(FlowId::new(3, 3), 5);
        p.set_qci(FlowId::new(2, 3), 1);
        let c = [cand(1, 90.0), cand(2, 50.0), cand(3, 10.0)];
        assert_eq!(p.select_next(&c, 0), Some(FlowId::new(3, 3)));

        // Without the QCI 5 flow, QCI 1 beats the default QCI 9
        assert_eq!(p.select_next(&c[..2], 1), Some(FlowId::new(2, 3)));
        assert_eq!(p.select_next(&[], 2), None);
    }

    #[test]
    fn test_priority_tie_goes_to_first() {
        let mut p = Priority::new(Direction::Ul);
        p.set_qci(FlowId::new(1, 3), 7);
        p.set_qci(FlowId::new(2, 3), 7);
        assert_eq!(p.select_next(&[cand(1, 1.0), cand(2, 100.0)], 0), Some(FlowId::new(1, 3)));

        p.release_flow(FlowId::new(1, 3));
        // A released flow falls back to the default level and loses to QCI 7
        assert_eq!(p.select_next(&[cand(1, 1.0), cand(2, 100.0)], 0), Some(FlowId::new(2, 3)));
    }
}
