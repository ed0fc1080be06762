use std::collections::{HashMap, VecDeque};

use lte_config::SharedConfig;
use lte_core::{SfnSf, lte_entities::LteEntity};
use lte_saps::SapMsg;

use crate::LteEntityTrait;

/// Order in which entities get their tick callbacks. Configuration first, then the MAC
/// that issues reports and triggers, then the scheduler answering them.
const TICK_ORDER: [LteEntity; 3] = [LteEntity::Rrc, LteEntity::Mac, LteEntity::Sched];

pub struct MessageQueue {
    messages: VecDeque<SapMsg>,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, message: SapMsg) {
        self.messages.push_back(message);
    }

    pub fn pop_front(&mut self) -> Option<SapMsg> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct MessageRouter {
    /// Currently unused by the router itself, kept so entities can be created from it later
    _config: SharedConfig,
    entities: HashMap<LteEntity, Box<dyn LteEntityTrait>>,
    msg_queue: MessageQueue,

    /// Current subframe, incremented at the end of each tick
    sfn_sf: SfnSf,
}

impl MessageRouter {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            entities: HashMap::new(),
            msg_queue: MessageQueue::new(),
            _config: config,
            sfn_sf: SfnSf::default(),
        }
    }

    pub fn set_sfn_sf(&mut self, sfn_sf: SfnSf) {
        self.sfn_sf = sfn_sf;
    }

    pub fn get_sfn_sf(&self) -> SfnSf {
        self.sfn_sf
    }

    pub fn register_entity(&mut self, entity: Box<dyn LteEntityTrait>) {
        let comp_type = entity.entity();
        tracing::debug!("register_entity {:?}", comp_type);
        self.entities.insert(comp_type, entity);
    }

    /// Returns a mut ref to a component of the requested type
    pub fn get_entity(&mut self, comp: LteEntity) -> Option<&mut dyn LteEntityTrait> {
        self.entities.get_mut(&comp).map(|entity| entity.as_mut())
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        tracing::debug!("submit_message {:?}: {:?} -> {:?} {}", message.get_sap(), message.get_source(), message.get_dest(), message.msg);
        self.msg_queue.push_back(message);
    }

    pub fn deliver_message(&mut self) {
        if let Some(message) = self.msg_queue.pop_front() {
            tracing::debug!("deliver_message: got {:?}: {:?} -> {:?} {}", message.get_sap(), message.get_source(), message.get_dest(), message.msg);

            // Check if the destination entity registered and deliver if found
            let dest = *message.get_dest();
            if let Some(entity) = self.entities.get_mut(&dest) {
                entity.rx_prim(&mut self.msg_queue, message);
            } else {
                tracing::warn!("deliver_message: entity {:?} not found for {:?}: {:?} -> {:?}", dest, message.get_sap(), message.get_source(), message.get_dest());
            }
        }
    }

    pub fn deliver_all_messages(&mut self) {
        while !self.msg_queue.is_empty() {
            self.deliver_message();
        }
    }

    pub fn get_msgqueue_len(&self) -> usize {
        self.msg_queue.len()
    }

    pub fn tick_start(&mut self) {
        tracing::info!("--- tick {} ----------------------------", self.sfn_sf);

        for target in TICK_ORDER {
            if let Some(entity) = self.entities.get_mut(&target) {
                entity.tick_start(&mut self.msg_queue, self.sfn_sf);
            }
        }
    }

    /// Runs the end-of-tick functions of all entities, delivering what each of them
    /// submits before moving on to the next one. Then advances the subframe clock.
    pub fn tick_end(&mut self) {
        tracing::debug!("############################ end-of-tick ############################");

        for target in TICK_ORDER {
            if let Some(entity) = self.entities.get_mut(&target) {
                tracing::trace!("tick_end for entity {:?}", target);
                entity.tick_end(&mut self.msg_queue, self.sfn_sf);
            }
            self.deliver_all_messages();
        }

        self.sfn_sf = self.sfn_sf.add_subframes(1);
    }

    /// Runs the full stack either forever or for a specified number of ticks.
    pub fn run_stack(&mut self, num_ticks: Option<usize>) {
        let mut ticks: usize = 0;

        loop {
            self.tick_start();

            // Deliver messages until queue empty
            self.deliver_all_messages();

            self.tick_end();

            ticks += 1;
            if let Some(num_ticks) = num_ticks {
                if ticks >= num_ticks {
                    break;
                }
            }
        }
    }
}
