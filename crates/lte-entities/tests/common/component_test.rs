use lte_config::{CfgCell, SchedConfig, SharedConfig};
use lte_core::lte_entities::LteEntity;
use lte_core::{Lcid, PolicyKind, Rnti, Sap, SfnSf, TxMode};
use lte_entities::{LteEntityTrait, MacScheduler, MessageRouter};
use lte_saps::csched::{CschedLcConfigReq, CschedUeConfigReq};
use lte_saps::fields::harq_info::{DlInfoListElement, UlInfoListElement};
use lte_saps::fields::lc_config::LogicalChannelConfig;
use lte_saps::sched::{SchedDlConfigInd, SchedDlRlcBufferReq, SchedDlTriggerReq, SchedUlConfigInd, SchedUlTriggerReq};
use lte_saps::{SapMsg, SapMsgInner};

use super::sink::Sink;

/// Creates a default config for testing: round robin, 25 RB cell. It can still be
/// modified as needed before passing it to the ComponentTest constructor
pub fn default_test_config() -> SchedConfig {
    let mut cfg = SchedConfig::new(PolicyKind::RoundRobin);
    cfg.cell = Some(CfgCell { dl_bandwidth: 25, ul_bandwidth: 25 });
    cfg
}

/// Infrastructure for testing the scheduler entity through the message router
/// The MAC and RRC are replaced by sinks collecting what the scheduler sends them
pub struct ComponentTest {
    pub config: SharedConfig,
    pub router: MessageRouter,
    pub sinks: Vec<LteEntity>,
}

impl ComponentTest {

    pub fn new(config: SchedConfig, start_sfn_sf: Option<SfnSf>) -> Self {
        let shared_config = SharedConfig::from_config(config);
        let mut mr = MessageRouter::new(shared_config.clone());
        mr.set_sfn_sf(start_sfn_sf.unwrap_or_default());

        Self {
            config: shared_config,
            router: mr,
            sinks: vec![],
        }
    }

    /// Scheduler entity plus MAC and RRC sinks
    pub fn with_default_stack(config: SchedConfig) -> Self {
        let mut test = Self::new(config, None);
        test.populate_entities(vec![LteEntity::Sched], vec![LteEntity::Mac, LteEntity::Rrc]);
        test
    }

    pub fn get_shared_config(&self) -> SharedConfig {
        self.config.clone()
    }

    pub fn populate_entities(&mut self, components: Vec<LteEntity>, sinks: Vec<LteEntity>) {
        for component in components.iter() {
            match component {
                LteEntity::Sched => {
                    let sched = MacScheduler::new(self.config.clone());
                    self.register_entity(sched);
                }
                _ => {
                    panic!("Component not implemented: {:?}", component);
                }
            }
        }

        // Create sinks for message collection
        for sink in sinks.iter() {
            assert!(!self.sinks.contains(sink), "Sink already exists: {:?}", sink);
            assert!(self.router.get_entity(*sink).is_none(), "Sink already registered as entity: {:?}", sink);

            self.sinks.push(*sink);
            self.register_entity(Sink::new(*sink));
        }
    }

    pub fn register_entity<T: 'static + LteEntityTrait>(&mut self, entity: T) {
        self.router.register_entity(Box::new(entity));
    }

    pub fn run_stack(&mut self, num_ticks: Option<usize>) {
        self.router.run_stack(num_ticks);
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        self.router.submit_message(message);
    }

    pub fn deliver_all_messages(&mut self) {
        self.router.deliver_all_messages();
    }

    pub fn dump_sinks(&mut self) -> Vec<SapMsg> {
        let mut msgs = vec![];
        for sink in self.sinks.iter() {
            if let Some(component) = self.router.get_entity(*sink) {
                if let Some(sink) = component.as_any_mut().downcast_mut::<Sink>() {
                    let mut sink_msgs = sink.take_msgqueue();
                    msgs.append(&mut sink_msgs);
                }
            }
        }
        msgs
    }

    /// Direct access to the scheduler entity for inspection
    pub fn scheduler(&mut self) -> &mut MacScheduler {
        self.router
            .get_entity(LteEntity::Sched)
            .and_then(|e| e.as_any_mut().downcast_mut::<MacScheduler>())
            .expect("scheduler entity not registered")
    }

    /// Submits a primitive to the scheduler, stamped with the current subframe
    pub fn send(&mut self, src: LteEntity, sap: Sap, msg: SapMsgInner) {
        let sfn_sf = self.router.get_sfn_sf();
        self.submit_message(SapMsg::new(sap, src, LteEntity::Sched, sfn_sf, msg));
    }

    /// Configures a UE with one logical channel, as the RRC would
    pub fn add_ue(&mut self, rnti: Rnti, tx_mode: TxMode, lcid: Lcid) {
        self.send(LteEntity::Rrc, Sap::CschedSap, SapMsgInner::CschedUeConfigReq(CschedUeConfigReq { rnti, tx_mode }));
        self.send(
            LteEntity::Rrc,
            Sap::CschedSap,
            SapMsgInner::CschedLcConfigReq(CschedLcConfigReq { rnti, lc_list: vec![LogicalChannelConfig::new(lcid, 0, 0)] }),
        );
        self.deliver_all_messages();
    }

    pub fn report_rlc_buffer(&mut self, rnti: Rnti, lcid: Lcid, tx_queue_size: u32) {
        let req = SchedDlRlcBufferReq { rnti, lcid, tx_queue_size, retx_queue_size: 0, status_pdu_size: 0 };
        self.send(LteEntity::Mac, Sap::SchedSap, SapMsgInner::SchedDlRlcBufferReq(req));
    }

    /// Runs one subframe with a DL trigger and returns the scheduler's answer
    pub fn trigger_dl(&mut self, dl_info_list: Vec<DlInfoListElement>) -> SchedDlConfigInd {
        let sfn_sf = self.router.get_sfn_sf();
        self.send(LteEntity::Mac, Sap::SchedSap, SapMsgInner::SchedDlTriggerReq(SchedDlTriggerReq { sfn_sf, dl_info_list }));
        self.run_stack(Some(1));
        let mut inds: Vec<SchedDlConfigInd> = self
            .dump_sinks()
            .into_iter()
            .filter_map(|m| match m.msg {
                SapMsgInner::SchedDlConfigInd(ind) => Some(ind),
                _ => None,
            })
            .collect();
        assert_eq!(inds.len(), 1, "expected exactly one dl config indication");
        inds.remove(0)
    }

    /// Runs one subframe with an UL trigger and returns the scheduler's answer
    pub fn trigger_ul(&mut self, ul_info_list: Vec<UlInfoListElement>) -> SchedUlConfigInd {
        let sfn_sf = self.router.get_sfn_sf();
        self.send(LteEntity::Mac, Sap::SchedSap, SapMsgInner::SchedUlTriggerReq(SchedUlTriggerReq { sfn_sf, ul_info_list }));
        self.run_stack(Some(1));
        let mut inds: Vec<SchedUlConfigInd> = self
            .dump_sinks()
            .into_iter()
            .filter_map(|m| match m.msg {
                SapMsgInner::SchedUlConfigInd(ind) => Some(ind),
                _ => None,
            })
            .collect();
        assert_eq!(inds.len(), 1, "expected exactly one ul config indication");
        inds.remove(0)
    }
}
