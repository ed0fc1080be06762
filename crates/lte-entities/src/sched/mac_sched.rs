use lte_config::SharedConfig;
use lte_core::lte_entities::LteEntity;
use lte_core::{Sap, SchedErr, SfnSf};
use lte_saps::sched::{SchedDlConfigInd, SchedUlConfigInd};
use lte_saps::{SapMsg, SapMsgInner};

use crate::{LteEntityTrait, MessageQueue};

use super::FfMacScheduler;

/// Message-driven wrapper around the scheduler. Requests arrive from the MAC and RRC,
/// trigger requests are answered with a config indication to the requester.
pub struct MacScheduler {
    self_component: LteEntity,
    sfn_sf: SfnSf,

    /// Access to this field is used only by testing code
    pub sched: FfMacScheduler,
}

impl MacScheduler {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            self_component: LteEntity::Sched,
            sfn_sf: SfnSf::default(),
            sched: FfMacScheduler::new(config),
        }
    }

    /// Scheduler errors mean the tables are inconsistent, there is no way to continue
    fn check<T>(result: Result<T, SchedErr>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("fatal scheduler error: {}", e);
                panic!("fatal scheduler error: {}", e);
            }
        }
    }

    fn rx_csched_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_csched_prim");
        match message.msg {
            SapMsgInner::CschedCellConfigReq(prim) => {
                self.sched.configure_cell(prim.dl_bandwidth, prim.ul_bandwidth);
            }
            SapMsgInner::CschedUeConfigReq(prim) => {
                self.sched.configure_ue(prim.rnti, prim.tx_mode);
            }
            SapMsgInner::CschedLcConfigReq(prim) => {
                for lc in prim.lc_list {
                    Self::check(self.sched.configure_logical_channel(prim.rnti, lc));
                }
            }
            SapMsgInner::CschedLcReleaseReq(prim) => {
                for lcid in prim.lcids {
                    self.sched.release_logical_channel(prim.rnti, lcid);
                }
            }
            SapMsgInner::CschedUeReleaseReq(prim) => {
                self.sched.release_ue(prim.rnti);
            }
            other => {
                tracing::warn!("rx_csched_prim: unexpected {} from {:?}", other, message.src);
            }
        }
    }

    fn rx_sched_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_sched_prim");
        let src = message.src;
        match message.msg {
            SapMsgInner::SchedDlRlcBufferReq(prim) => {
                self.sched.report_dl_rlc_buffer(prim);
            }
            SapMsgInner::SchedDlRachInfoReq(prim) => {
                self.sched.report_rach(prim.rach_list);
            }
            SapMsgInner::SchedDlCqiInfoReq(prim) => {
                self.sched.report_dl_cqi(prim.cqi_list);
            }
            SapMsgInner::SchedUlCqiInfoReq(prim) => {
                self.sched.report_ul_cqi(prim.sfn_sf, prim.ul_cqi);
            }
            SapMsgInner::SchedUlMacCtrlInfoReq(prim) => {
                self.sched.report_ul_mac_ce(prim.mac_ce_list);
            }
            SapMsgInner::SchedUlSrInfoReq(prim) => {
                self.sched.report_ul_sr(prim.sr_list);
            }
            SapMsgInner::SchedDlTriggerReq(prim) => {
                let ind: SchedDlConfigInd = Self::check(self.sched.trigger_dl(prim.sfn_sf, prim.dl_info_list));
                queue.push_back(SapMsg::new(
                    Sap::SchedSap,
                    self.self_component,
                    src,
                    self.sfn_sf,
                    SapMsgInner::SchedDlConfigInd(ind),
                ));
            }
            SapMsgInner::SchedUlTriggerReq(prim) => {
                let ind: SchedUlConfigInd = Self::check(self.sched.trigger_ul(prim.sfn_sf, prim.ul_info_list));
                queue.push_back(SapMsg::new(
                    Sap::SchedSap,
                    self.self_component,
                    src,
                    self.sfn_sf,
                    SapMsgInner::SchedUlConfigInd(ind),
                ));
            }
            other => {
                tracing::warn!("rx_sched_prim: unexpected {} from {:?}", other, src);
            }
        }
    }
}

impl LteEntityTrait for MacScheduler {
    fn entity(&self) -> LteEntity {
        self.self_component
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        match message.sap {
            Sap::CschedSap => {
                self.rx_csched_prim(queue, message);
            }
            Sap::SchedSap => {
                self.rx_sched_prim(queue, message);
            }
        }
    }

    fn tick_start(&mut self, _queue: &mut MessageQueue, sfn_sf: SfnSf) {
        self.sfn_sf = sfn_sf;
    }
}
