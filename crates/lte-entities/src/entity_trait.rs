use as_any::AsAny;
use lte_core::{SfnSf, lte_entities::LteEntity};
use lte_saps::SapMsg;
use crate::MessageQueue;

/// Trait for entities taking part in MAC scheduling
/// Used by MessageRouter for passing messages between entities
pub trait LteEntityTrait: Send + AsAny {
    /// Returns the entity type identifier
    fn entity(&self) -> LteEntity;

    /// Handle incoming SAP primitive
    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg);

    /// Called at the start of each subframe
    fn tick_start(&mut self, _queue: &mut MessageQueue, _sfn_sf: SfnSf) { }

    /// Called at the end of each subframe
    fn tick_end(&mut self, _queue: &mut MessageQueue, _sfn_sf: SfnSf) -> bool { false }
}
