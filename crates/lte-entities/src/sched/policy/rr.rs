use lte_core::{Direction, FlowId, PolicyKind};

use super::{FlowCandidate, FlowSelectionPolicy, TtiSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Next selection starts with this flow
    At(FlowId),
    /// Next selection starts with the flow after this one
    After(FlowId),
}

/// Serves flows in (RNTI, LCID) order, continuing where the previous selection left off
pub struct RoundRobin {
    dir: Direction,
    cursor: Option<Cursor>,
}

impl RoundRobin {
    pub fn new(dir: Direction) -> Self {
        Self { dir, cursor: None }
    }
}

impl FlowSelectionPolicy for RoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RoundRobin
    }

    fn select_next(&mut self, candidates: &[FlowCandidate], unit: usize) -> Option<FlowId> {
        let first = candidates.first()?.flow;
        let selected = match self.cursor {
            None => first,
            Some(Cursor::At(cur)) => candidates.iter().map(|c| c.flow).find(|f| *f >= cur).unwrap_or(first),
            Some(Cursor::After(cur)) => candidates.iter().map(|c| c.flow).find(|f| *f > cur).unwrap_or(first),
        };
        tracing::trace!("{} rr unit {} cursor {:?} -> {}", self.dir, unit, self.cursor, selected);
        self.cursor = Some(Cursor::At(selected));
        Some(selected)
    }

    fn on_assigned(&mut self, flow: FlowId, _unit: usize, satisfied: bool) {
        if satisfied {
            self.cursor = Some(Cursor::After(flow));
        }
    }

    fn end_tti(&mut self, summary: &TtiSummary) {
        if let Some((flow, satisfied)) = summary.last {
            self.cursor = if satisfied || summary.last_held_all {
                Some(Cursor::After(flow))
            } else {
                Some(Cursor::At(flow))
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands(flows: &[(u16, u8)]) -> Vec<FlowCandidate> {
        flows
            .iter()
            .map(|&(r, l)| FlowCandidate { flow: FlowId::new(r, l), achievable_rate: 1.0 })
            .collect()
    }

    #[test]
    fn test_rr_moves_past_satisfied() {
        let mut rr = RoundRobin::new(Direction::Dl);
        let c = cands(&[(1, 1), (2, 1), (3, 1)]);
        assert_eq!(rr.select_next(&c, 0), Some(FlowId::new(1, 1)));
        rr.on_assigned(FlowId::new(1, 1), 0, false);
        assert_eq!(rr.select_next(&c, 1), Some(FlowId::new(1, 1)));
        rr.on_assigned(FlowId::new(1, 1), 1, true);

        let c = cands(&[(2, 1), (3, 1)]);
        assert_eq!(rr.select_next(&c, 2), Some(FlowId::new(2, 1)));
        rr.on_assigned(FlowId::new(2, 1), 2, true);
        let c = cands(&[(3, 1)]);
        assert_eq!(rr.select_next(&c, 3), Some(FlowId::new(3, 1)));
    }

    #[test]
    fn test_rr_wraps() {
        let mut rr = RoundRobin::new(Direction::Ul);
        let c = cands(&[(1, 0), (2, 0)]);
        rr.on_assigned(FlowId::new(2, 0), 0, true);
        assert_eq!(rr.select_next(&c, 1), Some(FlowId::new(1, 0)));
    }

    #[test]
    fn test_rr_end_tti_cursor() {
        let mut rr = RoundRobin::new(Direction::Dl);
        let c = cands(&[(1, 1), (2, 1)]);

        // Unsatisfied, held only part of the TTI: continues next TTI
        rr.end_tti(&TtiSummary { last: Some((FlowId::new(2, 1), false)), ..Default::default() });
        assert_eq!(rr.select_next(&c, 0), Some(FlowId::new(2, 1)));

        // Held every unit: the others get their turn
        rr.end_tti(&TtiSummary { last: Some((FlowId::new(2, 1), false)), last_held_all: true, ..Default::default() });
        assert_eq!(rr.select_next(&c, 0), Some(FlowId::new(1, 1)));
    }
}
