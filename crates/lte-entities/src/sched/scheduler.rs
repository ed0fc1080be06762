use lte_config::SharedConfig;
use lte_core::conversions::{bsr_id_to_buffer_size, fp_s11dot3_to_f64};
use lte_core::{Direction, FlowId, Lcid, Rnti, SchedErr, SfnSf, TxMode, UlCqiFilter, unimplemented_log};
use lte_saps::fields::build_data::RachListElement;
use lte_saps::fields::cqi::{CqiListElement, CqiType, UlCqi, UlCqiType};
use lte_saps::fields::harq_info::{DlInfoListElement, UlInfoListElement};
use lte_saps::fields::lc_config::LogicalChannelConfig;
use lte_saps::fields::mac_ce::{MacCeListElement, MacCeType};
use lte_saps::sched::{SchedDlConfigInd, SchedDlRlcBufferReq, SchedUlConfigInd};

use super::dl_engine::DlEngine;
use super::policy::priority::{DEFAULT_QCI, qci_priority};
use super::policy::{FlowSelectionPolicy, new_policy};
use super::subcomp::cell_config::CellConfig;
use super::subcomp::harq::{DlHarqManager, UlHarqManager};
use super::subcomp::ue_registry::{RlcBufferStatus, UeRegistry};
use super::ul_engine::UlEngine;

/// PDCCH size announced with every DL configuration
const NR_OF_PDCCH_OFDM_SYMBOLS: u8 = 1;

/// Per-cell scheduler context. Owns every table; each call runs to completion.
pub struct FfMacScheduler {
    config: SharedConfig,
    cell: Option<CellConfig>,
    ues: UeRegistry,
    dl_harq: DlHarqManager,
    ul_harq: UlHarqManager,
    dl: DlEngine,
    ul: UlEngine,

    /// Random access requests waiting for the next DL trigger
    rach_list: Vec<RachListElement>,
}

impl FfMacScheduler {
    pub fn new(config: SharedConfig) -> Self {
        let c = config.config();
        let mut sched = Self {
            cell: None,
            ues: UeRegistry::new(c.cqi_timer_threshold),
            dl_harq: DlHarqManager::new(c.harq_enabled),
            ul_harq: UlHarqManager::new(c.harq_enabled),
            dl: DlEngine::new(new_policy(c.policy, Direction::Dl, c.pf_time_window)),
            ul: UlEngine::new(new_policy(c.policy, Direction::Ul, c.pf_time_window)),
            rach_list: Vec::new(),
            config,
        };
        if let Some(cell) = &c.cell {
            sched.configure_cell(cell.dl_bandwidth, cell.ul_bandwidth);
        }
        sched
    }

    pub fn cell(&self) -> Option<&CellConfig> {
        self.cell.as_ref()
    }

    pub fn registry(&self) -> &UeRegistry {
        &self.ues
    }

    pub fn dl_harq(&self) -> &DlHarqManager {
        &self.dl_harq
    }

    pub fn ul_harq(&self) -> &UlHarqManager {
        &self.ul_harq
    }

    pub fn policy(&self, dir: Direction) -> &dyn FlowSelectionPolicy {
        match dir {
            Direction::Dl => self.dl.policy(),
            Direction::Ul => self.ul.policy(),
        }
    }

    ///////// CSCHED /////////

    pub fn configure_cell(&mut self, dl_bandwidth: u8, ul_bandwidth: u8) {
        let ul_grant_mcs = self.config.config().ul_grant_mcs;
        match CellConfig::new(dl_bandwidth, ul_bandwidth, ul_grant_mcs) {
            Some(cell) => {
                tracing::info!(
                    "cell configured: dl {} rbs ({} rbgs of {}), ul {} rbs",
                    cell.dl_bandwidth,
                    cell.rbg_num(),
                    cell.rbg_size,
                    cell.ul_bandwidth
                );
                self.cell = Some(cell);
                self.ul.drop_rach_grants();
            }
            None => {
                tracing::warn!("invalid cell bandwidth dl {} ul {}, ignored", dl_bandwidth, ul_bandwidth);
            }
        }
    }

    /// Adds a UE or changes its transmission mode
    pub fn configure_ue(&mut self, rnti: Rnti, tx_mode: TxMode) {
        let is_new = self.ues.add_ue(rnti, tx_mode);
        self.dl_harq.add_ue(rnti);
        self.ul_harq.add_ue(rnti);
        if is_new {
            self.ul.policy_mut().register_flow(FlowId::ue(rnti));
        }
    }

    pub fn configure_logical_channel(&mut self, rnti: Rnti, lc: LogicalChannelConfig) -> Result<(), SchedErr> {
        let flow = FlowId::new(rnti, lc.lcid);
        let qci = lc.qci;
        self.ues.add_lc(rnti, lc)?;
        self.dl.policy_mut().register_flow(flow);
        self.dl.policy_mut().set_qci(flow, qci);
        self.update_ul_qci(rnti);
        Ok(())
    }

    /// The UL flow of a UE carries the most urgent QCI among its logical channels
    fn update_ul_qci(&mut self, rnti: Rnti) {
        let best = self
            .ues
            .lcids(rnti)
            .into_iter()
            .filter_map(|lcid| self.ues.lc_config(FlowId::new(rnti, lcid)))
            .map(|lc| lc.qci)
            .min_by_key(|&qci| qci_priority(qci))
            .unwrap_or(DEFAULT_QCI);
        self.ul.policy_mut().set_qci(FlowId::ue(rnti), best);
    }

    pub fn release_logical_channel(&mut self, rnti: Rnti, lcid: Lcid) {
        if !self.ues.remove_lc(rnti, lcid) {
            tracing::warn!("release of unknown logical channel {}/{}", rnti, lcid);
            return;
        }
        self.dl.policy_mut().release_flow(FlowId::new(rnti, lcid));
        self.update_ul_qci(rnti);
    }

    pub fn release_ue(&mut self, rnti: Rnti) {
        if !self.ues.has_ue(rnti) {
            tracing::warn!("release of unknown ue {}", rnti);
            return;
        }
        for lcid in self.ues.remove_ue(rnti) {
            self.dl.policy_mut().release_flow(FlowId::new(rnti, lcid));
        }
        self.ul.policy_mut().release_flow(FlowId::ue(rnti));
        self.dl_harq.remove_ue(rnti);
        self.ul_harq.remove_ue(rnti);
        self.dl.forget_ue(rnti);
        tracing::debug!("ue {} released", rnti);
    }

    ///////// SCHED REPORTS /////////

    /// Replaces the RLC buffer state of a logical channel
    pub fn report_dl_rlc_buffer(&mut self, req: SchedDlRlcBufferReq) {
        let flow = FlowId::new(req.rnti, req.lcid);
        if !self.ues.has_lc(flow) {
            tracing::warn!("rlc buffer report for unknown logical channel {}", flow);
            return;
        }
        self.ues.set_rlc_buffer(flow, RlcBufferStatus {
            tx_queue_size: req.tx_queue_size,
            retx_queue_size: req.retx_queue_size,
            status_pdu_size: req.status_pdu_size,
        });
    }

    /// Queues random access requests, answered by the next DL trigger
    pub fn report_rach(&mut self, rach_list: Vec<RachListElement>) {
        self.rach_list.extend(rach_list);
    }

    pub fn report_dl_cqi(&mut self, cqi_list: Vec<CqiListElement>) {
        for report in cqi_list {
            let rnti = report.rnti;
            if !self.ues.has_ue(rnti) {
                tracing::warn!("dl cqi for unknown rnti {}", rnti);
                continue;
            }
            match report.cqi_type {
                CqiType::P10 => {
                    tracing::trace!("wideband cqi rnti {}: {:?}", rnti, report.wb_cqi);
                    self.ues.set_dl_wideband_cqi(rnti, report.wb_cqi);
                }
                CqiType::A30 => {
                    let sb_cqi = report
                        .sb_measurement
                        .higher_layer_selected
                        .into_iter()
                        .map(|sb| sb.sb_cqi)
                        .collect();
                    self.ues.set_dl_subband_cqi(rnti, sb_cqi);
                }
                other => {
                    unimplemented_log!("dl cqi type {:?} of rnti {}", other, rnti);
                }
            }
        }
    }

    /// Stores an UL SINR report. `sfn_sf` is the subframe the measurement refers to,
    /// needed to map PUSCH measurements back to the UEs that transmitted.
    pub fn report_ul_cqi(&mut self, sfn_sf: SfnSf, ul_cqi: UlCqi) {
        let filter = self.config.config().ul_cqi_filter;
        let accepted = match (filter, ul_cqi.cqi_type) {
            (UlCqiFilter::All, _) => true,
            (UlCqiFilter::Srs, UlCqiType::Srs { .. }) => true,
            (UlCqiFilter::Pusch, UlCqiType::Pusch) => true,
            (_, UlCqiType::Pucch1 | UlCqiType::Pucch2 | UlCqiType::Prach) => true,
            _ => false,
        };
        if !accepted {
            tracing::trace!("ul cqi {:?} filtered out", ul_cqi.cqi_type);
            return;
        }

        let sinr: Vec<f64> = ul_cqi.sinr.iter().map(|&fp| fp_s11dot3_to_f64(fp)).collect();
        match ul_cqi.cqi_type {
            UlCqiType::Srs { rnti } => {
                if !self.ues.has_ue(rnti) {
                    tracing::warn!("srs sinr for unknown rnti {}", rnti);
                    return;
                }
                self.ues.set_ul_sinr(rnti, sinr);
            }
            UlCqiType::Pusch => {
                let Some(owners) = self.ul.take_alloc_record(sfn_sf) else {
                    tracing::debug!("no ul allocation recorded for {}, pusch sinr dropped", sfn_sf);
                    return;
                };
                let num_rbs = owners.len();
                for (rb, owner) in owners.into_iter().enumerate() {
                    let (Some(rnti), Some(&value)) = (owner, sinr.get(rb)) else {
                        continue;
                    };
                    if self.ues.has_ue(rnti) {
                        self.ues.set_ul_sinr_rb(rnti, rb, value, num_rbs);
                    }
                }
            }
            other => {
                unimplemented_log!("ul cqi type {:?}", other);
            }
        }
    }

    pub fn report_ul_mac_ce(&mut self, mac_ce_list: Vec<MacCeListElement>) {
        for ce in mac_ce_list {
            let rnti = ce.rnti;
            match ce.ce_type {
                MacCeType::Bsr => {
                    if !self.ues.has_ue(rnti) {
                        tracing::warn!("bsr for unknown rnti {}", rnti);
                        continue;
                    }
                    let bytes = ce.value.buffer_status.iter().map(|&id| bsr_id_to_buffer_size(id)).sum();
                    tracing::debug!("bsr rnti {}: {:?} -> {} bytes", rnti, ce.value.buffer_status, bytes);
                    self.ues.set_bsr(rnti, bytes);
                }
                other => {
                    unimplemented_log!("mac ce {:?} of rnti {}", other, rnti);
                }
            }
        }
    }

    /// Scheduling requests are accepted, but grants follow the buffer status reports
    pub fn report_ul_sr(&mut self, sr_list: Vec<Rnti>) {
        if !sr_list.is_empty() {
            tracing::debug!("scheduling requests from {:?} ignored", sr_list);
        }
    }

    ///////// TRIGGERS /////////

    pub fn trigger_dl(&mut self, sfn_sf: SfnSf, feedback: Vec<DlInfoListElement>) -> Result<SchedDlConfigInd, SchedErr> {
        let cell = self.cell.as_ref().ok_or(SchedErr::CellNotConfigured)?;

        let build_rar_list = self.ul.build_rar_grants(cell, std::mem::take(&mut self.rach_list));
        let build_data_list = self.dl.schedule(cell, &mut self.ues, &mut self.dl_harq, sfn_sf, feedback)?;

        tracing::debug!(sf = %sfn_sf, "dl config: {} data, {} rar", build_data_list.len(), build_rar_list.len());
        Ok(SchedDlConfigInd {
            build_data_list,
            build_rar_list,
            nr_of_pdcch_ofdm_symbols: NR_OF_PDCCH_OFDM_SYMBOLS,
        })
    }

    pub fn trigger_ul(&mut self, sfn_sf: SfnSf, feedback: Vec<UlInfoListElement>) -> Result<SchedUlConfigInd, SchedErr> {
        let cell = self.cell.as_ref().ok_or(SchedErr::CellNotConfigured)?;
        let dci_list = self.ul.schedule(cell, &mut self.ues, &mut self.ul_harq, sfn_sf, feedback)?;
        tracing::debug!(sf = %sfn_sf, "ul config: {} dcis", dci_list.len());
        Ok(SchedUlConfigInd { dci_list })
    }
}
