use lte_core::lte_entities::LteEntity;
use lte_entities::{LteEntityTrait, MessageQueue};
use lte_saps::SapMsg;

/// An entity sink for testing purposes
/// Collects all received SapMsg messages for later inspection
pub struct Sink {
    component: LteEntity,
    msgqueue: Vec<SapMsg>,
}

impl Sink {
    pub fn new(component: LteEntity) -> Self {
        Self {
            component,
            msgqueue: vec![],
        }
    }

    pub fn take_msgqueue(&mut self) -> Vec<SapMsg> {
        std::mem::take(&mut self.msgqueue)
    }
}

impl LteEntityTrait for Sink {

    fn entity(&self) -> LteEntity {
        self.component
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        tracing::debug!("rx_prim: {} from {:?}", message.msg, message.src);
        self.msgqueue.push(message);
    }
}
