use lte_core::{Direction, FlowId, PolicyKind};

use super::{FlowCandidate, FlowSelectionPolicy, argmax_by};

/// Always picks the flow with the best achievable rate on the unit
pub struct MaxThroughput {
    dir: Direction,
}

impl MaxThroughput {
    pub fn new(dir: Direction) -> Self {
        Self { dir }
    }
}

impl FlowSelectionPolicy for MaxThroughput {
    fn kind(&self) -> PolicyKind {
        PolicyKind::MaxThroughput
    }

    fn select_next(&mut self, candidates: &[FlowCandidate], unit: usize) -> Option<FlowId> {
        let selected = argmax_by(candidates, |c| c.achievable_rate);
        tracing::trace!("{} mt unit {} -> {:?}", self.dir, unit, selected);
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mt_picks_best_rate() {
        let mut mt = MaxThroughput::new(Direction::Dl);
        let c = [
            FlowCandidate { flow: FlowId::new(1, 3), achievable_rate: 10.0 },
            FlowCandidate { flow: FlowId::new(2, 3), achievable_rate: 30.0 },
            FlowCandidate { flow: FlowId::new(3, 3), achievable_rate: 30.0 },
        ];
        assert_eq!(mt.select_next(&c, 0), Some(FlowId::new(2, 3)));
        assert_eq!(mt.select_next(&[], 0), None);
    }
}
