use std::collections::{BTreeMap, BTreeSet};

use lte_core::amc::{dl_tbs_bits, mcs_from_cqi};
use lte_core::{FlowId, HARQ_ID_INVALID, HARQ_MAX_TX, ResourceMap, Rnti, SchedErr, SfnSf};
use lte_saps::fields::build_data::{BuildDataListElement, RlcPduListElement};
use lte_saps::fields::dci::DlDci;
use lte_saps::fields::harq_info::{DlInfoListElement, HarqStatus};

use super::policy::{FlowCandidate, FlowSelectionPolicy, TtiSummary};
use super::subcomp::cell_config::CellConfig;
use super::subcomp::harq::{DlHarqManager, RlcPduList};
use super::subcomp::ue_registry::UeRegistry;

const TTI_SECONDS: f64 = 0.001;

/// MCS for a layer over a set of RBGs, limited by the worst CQI among them
fn worst_mcs(ues: &UeRegistry, rnti: Rnti, rbgs: &[usize], layer: usize) -> u8 {
    let cqi = rbgs.iter().map(|&rbg| ues.dl_cqi(rnti, rbg, layer)).min().unwrap_or(1);
    mcs_from_cqi(cqi)
}

/// Bytes per second a UE would get from a single RBG, summed over its usable layers
fn rbg_rate(ues: &UeRegistry, rnti: Rnti, rbg: usize, rbg_size: usize) -> f64 {
    let bytes: u32 = (0..ues.num_layers(rnti))
        .map(|layer| ues.dl_cqi(rnti, rbg, layer))
        .filter(|&cqi| cqi > 0)
        .map(|cqi| dl_tbs_bits(mcs_from_cqi(cqi), rbg_size) / 8)
        .sum();
    bytes as f64 / TTI_SECONDS
}

/// Downlink allocation over the RBG grid of one TTI: HARQ retransmissions first,
/// then new data, one RBG at a time as chosen by the flow selection policy
pub struct DlEngine {
    policy: Box<dyn FlowSelectionPolicy>,
    /// NACKs that found no room in their TTI, retried in the next one
    pending_feedback: Vec<DlInfoListElement>,
}

impl DlEngine {
    pub fn new(policy: Box<dyn FlowSelectionPolicy>) -> Self {
        Self {
            policy,
            pending_feedback: Vec::new(),
        }
    }

    pub fn policy(&self) -> &dyn FlowSelectionPolicy {
        self.policy.as_ref()
    }

    pub fn policy_mut(&mut self) -> &mut dyn FlowSelectionPolicy {
        self.policy.as_mut()
    }

    /// Drops buffered feedback of a released UE
    pub fn forget_ue(&mut self, rnti: Rnti) {
        self.pending_feedback.retain(|fb| fb.rnti != rnti);
    }

    pub fn pending_feedback(&self) -> &[DlInfoListElement] {
        &self.pending_feedback
    }

    pub fn schedule(
        &mut self,
        cell: &CellConfig,
        ues: &mut UeRegistry,
        harq: &mut DlHarqManager,
        sfn_sf: SfnSf,
        feedback: Vec<DlInfoListElement>,
    ) -> Result<Vec<BuildDataListElement>, SchedErr> {
        ues.refresh_dl_cqi();
        for (rnti, id) in harq.refresh() {
            tracing::debug!("{} dl harq process {} of rnti {} timed out", sfn_sf, id, rnti);
            self.pending_feedback.retain(|fb| fb.rnti != rnti || fb.harq_process_id != id);
        }

        let mut rbg_map = ResourceMap::new(cell.rbg_num());
        let mut harq_served = BTreeSet::new();

        let mut data_list = self.process_harq_feedback(ues, harq, feedback, &mut rbg_map, &mut harq_served)?;
        let mut new_data = self.allocate_new_data(cell, ues, harq, &mut rbg_map, &harq_served)?;
        data_list.append(&mut new_data);

        tracing::debug!(sf = %sfn_sf, "dl rbgs [{}], {} grants", rbg_map.dump(), data_list.len());
        Ok(data_list)
    }

    ///////// HARQ RETRANSMISSIONS /////////

    fn process_harq_feedback(
        &mut self,
        ues: &UeRegistry,
        harq: &mut DlHarqManager,
        feedback: Vec<DlInfoListElement>,
        rbg_map: &mut ResourceMap,
        served: &mut BTreeSet<Rnti>,
    ) -> Result<Vec<BuildDataListElement>, SchedErr> {
        let mut all_feedback = std::mem::take(&mut self.pending_feedback);
        if !harq.is_enabled() {
            if !feedback.is_empty() {
                tracing::trace!("harq disabled, discarding {} dl feedback elements", feedback.len());
            }
            return Ok(Vec::new());
        }
        all_feedback.extend(feedback);

        let mut retx_list = Vec::new();
        for fb in all_feedback {
            let rnti = fb.rnti;
            let id = fb.harq_process_id;
            if !harq.has_ue(rnti) || !ues.has_ue(rnti) {
                tracing::warn!("dl harq feedback for unknown rnti {}", rnti);
                continue;
            }
            if !fb.is_nack() {
                tracing::trace!("dl harq ack rnti {} process {}", rnti, id);
                harq.release(rnti, id)?;
                self.pending_feedback.retain(|fb| fb.rnti != rnti || fb.harq_process_id != id);
                continue;
            }

            let Some(dci) = harq.pending_dci(rnti, id)?.cloned() else {
                tracing::debug!("dl nack for idle process {} of rnti {}, ignored", id, rnti);
                continue;
            };
            if served.contains(&rnti) {
                // One retransmission per UE and TTI
                self.pending_feedback.push(fb);
                continue;
            }

            let nacked: Vec<bool> = (0..dci.num_layers())
                .map(|layer| fb.harq_status.get(layer).is_some_and(|s| *s != HarqStatus::Ack))
                .collect();
            let transmissions = nacked
                .iter()
                .zip(&dci.rv)
                .filter(|(nack, _)| **nack)
                .map(|(_, rv)| rv + 1)
                .max()
                .unwrap_or(0);
            if transmissions >= HARQ_MAX_TX {
                tracing::debug!("dl harq rnti {} process {} failed {} times, dropped", rnti, id, transmissions);
                harq.release(rnti, id)?;
                continue;
            }

            let prev_rbgs = dci.rbgs();
            let rbgs = if prev_rbgs.iter().all(|&rbg| rbg_map.is_free(rbg)) {
                prev_rbgs
            } else {
                let start = prev_rbgs.last().map_or(0, |last| last + 1);
                match rbg_map.find_free_units_from(start, prev_rbgs.len()) {
                    Some(rbgs) => rbgs,
                    None => {
                        tracing::debug!("no room for dl retx of rnti {} process {}, buffered", rnti, id);
                        self.pending_feedback.push(fb);
                        continue;
                    }
                }
            };
            if let Err(e) = rbg_map.reserve_units(&rbgs, rnti) {
                tracing::warn!("dl retx of rnti {} could not reserve {:?}: {:?}", rnti, rbgs, e);
                self.pending_feedback.push(fb);
                continue;
            }

            let mut new_dci = dci;
            new_dci.rb_bitmap = DlDci::bitmap_from_rbgs(&rbgs);
            for (layer, nack) in nacked.iter().enumerate() {
                new_dci.ndi[layer] = 0;
                if *nack {
                    new_dci.rv[layer] += 1;
                } else {
                    // Layer already acknowledged, send an empty TB on it
                    new_dci.rv[layer] = 0;
                    new_dci.mcs[layer] = 0;
                    new_dci.tbs_size[layer] = 0;
                }
            }

            let rlc_pdu_list: RlcPduList = harq
                .rlc_pdus(rnti, id)?
                .iter()
                .map(|per_lc| {
                    per_lc
                        .iter()
                        .enumerate()
                        .map(|(layer, pdu)| {
                            if nacked.get(layer).copied().unwrap_or(false) {
                                *pdu
                            } else {
                                RlcPduListElement { lcid: pdu.lcid, size: 0 }
                            }
                        })
                        .collect()
                })
                .collect();

            tracing::debug!("dl retx rnti {} process {} rbgs {:?} rv {:?}", rnti, id, rbgs, new_dci.rv);
            harq.record_retransmission(rnti, id, new_dci.clone())?;
            served.insert(rnti);
            retx_list.push(BuildDataListElement { rnti, dci: new_dci, rlc_pdu_list });
        }
        Ok(retx_list)
    }

    ///////// NEW DATA /////////

    fn allocate_new_data(
        &mut self,
        cell: &CellConfig,
        ues: &mut UeRegistry,
        harq: &mut DlHarqManager,
        rbg_map: &mut ResourceMap,
        harq_served: &BTreeSet<Rnti>,
    ) -> Result<Vec<BuildDataListElement>, SchedErr> {
        let rbg_size = cell.rbg_size;

        let mut flows = Vec::new();
        for flow in ues.dl_flows_with_data() {
            if harq_served.contains(&flow.rnti) {
                continue;
            }
            if !harq.is_available(flow.rnti)? {
                tracing::debug!("no free dl harq process for rnti {}", flow.rnti);
                continue;
            }
            flows.push(flow);
        }

        // Walk the free RBGs, asking the policy for each
        let mut assigned: BTreeMap<FlowId, Vec<usize>> = BTreeMap::new();
        let mut satisfied: BTreeSet<FlowId> = BTreeSet::new();
        let mut last: Option<FlowId> = None;
        for rbg in 0..cell.rbg_num() {
            if !rbg_map.is_free(rbg) {
                continue;
            }
            let reg: &UeRegistry = ues;
            let candidates: Vec<FlowCandidate> = flows
                .iter()
                .filter(|flow| !satisfied.contains(*flow))
                .filter(|flow| reg.dl_cqi(flow.rnti, rbg, 0) > 0)
                .map(|&flow| FlowCandidate { flow, achievable_rate: rbg_rate(reg, flow.rnti, rbg, rbg_size) })
                .collect();
            let Some(flow) = self.policy.select_next(&candidates, rbg) else {
                continue;
            };
            if let Err(e) = rbg_map.reserve(rbg, flow.rnti) {
                tracing::warn!("rbg {} for {} not reserved: {:?}", rbg, flow, e);
                continue;
            }

            let rbgs = assigned.entry(flow).or_default();
            rbgs.push(rbg);
            let pending = reg.rlc_buffer(flow).map_or(0, |b| b.pending());
            let layers = reg.num_layers(flow.rnti) as u32;
            let mcs = worst_mcs(reg, flow.rnti, rbgs, 0);
            let is_satisfied = dl_tbs_bits(mcs, rbgs.len() * rbg_size) / 8 * layers >= pending;
            if is_satisfied {
                satisfied.insert(flow);
            }
            self.policy.on_assigned(flow, rbg, is_satisfied);
            last = Some(flow);
        }

        // Commit per UE
        let mut per_ue: BTreeMap<Rnti, Vec<(FlowId, &Vec<usize>)>> = BTreeMap::new();
        for (flow, rbgs) in &assigned {
            per_ue.entry(flow.rnti).or_default().push((*flow, rbgs));
        }

        let mut summary = TtiSummary::default();
        let mut data_list = Vec::new();
        for (rnti, lc_allocs) in per_ue {
            let harq_id = harq.acquire(rnti)?;
            if harq_id == HARQ_ID_INVALID {
                tracing::warn!("rnti {} lost its dl harq process, skipped", rnti);
                continue;
            }

            let ue_rbgs: Vec<usize> = lc_allocs.iter().flat_map(|(_, rbgs)| rbgs.iter().copied()).collect();
            let layers = ues.num_layers(rnti);
            let mcs: Vec<u8> = (0..layers).map(|layer| worst_mcs(&*ues, rnti, &ue_rbgs, layer)).collect();
            let nprb = ue_rbgs.len() * rbg_size;
            let tbs_size: Vec<u16> = mcs.iter().map(|&m| (dl_tbs_bits(m, nprb) / 8) as u16).collect();

            let mut rlc_pdu_list: RlcPduList = Vec::with_capacity(lc_allocs.len());
            for (flow, rbgs) in &lc_allocs {
                let lc_nprb = rbgs.len() * rbg_size;
                let per_layer: Vec<RlcPduListElement> = mcs
                    .iter()
                    .map(|&m| RlcPduListElement { lcid: flow.lcid, size: (dl_tbs_bits(m, lc_nprb) / 8) as u16 })
                    .collect();
                for pdu in &per_layer {
                    ues.update_dl_rlc_buffer(*flow, pdu.size as u32)?;
                }
                *summary.bytes.entry(*flow).or_default() += per_layer.iter().map(|p| p.size as u32).sum::<u32>();
                rlc_pdu_list.push(per_layer);
            }

            let dci = DlDci {
                rnti,
                rb_bitmap: DlDci::bitmap_from_rbgs(&ue_rbgs),
                res_alloc: 0,
                tbs_size,
                mcs,
                ndi: vec![1; layers],
                rv: vec![0; layers],
                harq_process: harq_id,
                tpc: 1,
            };
            tracing::debug!("dl grant rnti {} process {} rbgs {:?} mcs {:?} tbs {:?}", rnti, harq_id, ue_rbgs, dci.mcs, dci.tbs_size);
            harq.record_transmission(rnti, harq_id, dci.clone(), rlc_pdu_list.clone())?;
            data_list.push(BuildDataListElement { rnti, dci, rlc_pdu_list });
        }

        summary.last = last.map(|flow| (flow, satisfied.contains(&flow)));
        summary.last_held_all = last
            .and_then(|flow| assigned.get(&flow))
            .is_some_and(|rbgs| rbgs.len() == cell.rbg_num());
        self.policy.end_tti(&summary);

        Ok(data_list)
    }
}

#[cfg(test)]
mod tests {
    use lte_core::{Direction, HARQ_DL_TIMEOUT, PolicyKind, TxMode, debug};
    use lte_saps::fields::lc_config::LogicalChannelConfig;

    use crate::sched::policy::new_policy;
    use crate::sched::subcomp::ue_registry::RlcBufferStatus;

    use super::*;

    struct Setup {
        cell: CellConfig,
        ues: UeRegistry,
        harq: DlHarqManager,
        engine: DlEngine,
    }

    fn setup(policy: PolicyKind) -> Setup {
        debug::setup_logging_verbose();
        Setup {
            cell: CellConfig::new(25, 25, 0).unwrap(),
            ues: UeRegistry::new(1000),
            harq: DlHarqManager::new(true),
            engine: DlEngine::new(new_policy(policy, Direction::Dl, 99.0)),
        }
    }

    impl Setup {
        fn add_ue(&mut self, rnti: Rnti, tx_mode: TxMode, cqi: u8, tx_queue: u32) {
            self.ues.add_ue(rnti, tx_mode);
            self.harq.add_ue(rnti);
            self.ues.add_lc(rnti, LogicalChannelConfig::new(3, 0, 0)).unwrap();
            self.engine.policy_mut().register_flow(FlowId::new(rnti, 3));
            self.ues.set_dl_wideband_cqi(rnti, vec![cqi; tx_mode.num_layers()]);
            self.ues.set_rlc_buffer(FlowId::new(rnti, 3), RlcBufferStatus { tx_queue_size: tx_queue, ..Default::default() });
        }

        fn run(&mut self, feedback: Vec<DlInfoListElement>) -> Vec<BuildDataListElement> {
            self.engine.schedule(&self.cell, &mut self.ues, &mut self.harq, SfnSf::default(), feedback).unwrap()
        }
    }

    #[test]
    fn test_single_flow_satisfied() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let out = s.run(vec![]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.rbgs(), vec![0, 1, 2]);
        assert_eq!(out[0].dci.mcs, vec![28]);
        assert_eq!(out[0].dci.tbs_size, vec![549]);
        assert_eq!(out[0].rlc_pdu_list, vec![vec![RlcPduListElement { lcid: 3, size: 549 }]]);
        assert_eq!(s.ues.rlc_buffer(FlowId::new(1, 3)).unwrap().tx_queue_size, 0);
    }

    #[test]
    fn test_mimo_sizes_every_layer() {
        let mut s = setup(PolicyKind::MaxThroughput);
        s.add_ue(1, TxMode::SpatialMuxOpenLoop, 15, 500);
        let out = s.run(vec![]);
        // Two layers of 373 bytes cover 500 bytes with two RBGs
        assert_eq!(out[0].dci.rbg_count(), 2);
        assert_eq!(out[0].dci.ndi, vec![1, 1]);
        assert_eq!(out[0].rlc_pdu_list[0].len(), 2);
        assert_eq!(out[0].total_pdu_bytes(), 746);
    }

    #[test]
    fn test_cqi_zero_never_selected() {
        let mut s = setup(PolicyKind::MaxThroughput);
        s.add_ue(1, TxMode::Siso, 0, 500);
        assert!(s.run(vec![]).is_empty());
        assert_eq!(s.ues.rlc_buffer(FlowId::new(1, 3)).unwrap().tx_queue_size, 500);
    }

    #[test]
    fn test_subband_cqi_steers_mt() {
        let mut s = setup(PolicyKind::MaxThroughput);
        s.add_ue(1, TxMode::Siso, 7, 100_000);
        s.add_ue(2, TxMode::Siso, 7, 100_000);
        // UE 2 is much better on the upper half of the band
        let sb: Vec<Vec<u8>> = (0..12).map(|rbg| vec![if rbg < 6 { 3 } else { 15 }]).collect();
        s.ues.set_dl_subband_cqi(2, sb);
        let out = s.run(vec![]);
        let ue1 = out.iter().find(|e| e.rnti == 1).unwrap();
        let ue2 = out.iter().find(|e| e.rnti == 2).unwrap();
        assert_eq!(ue1.dci.rbgs(), (0..6).collect::<Vec<_>>());
        assert_eq!(ue2.dci.rbgs(), (6..12).collect::<Vec<_>>());
        assert_eq!(ue2.dci.mcs, vec![28]);
    }

    #[test]
    fn test_nack_retransmits_on_same_rbgs() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let first = s.run(vec![]);
        let id = first[0].dci.harq_process;

        s.ues.set_rlc_buffer(FlowId::new(1, 3), RlcBufferStatus { tx_queue_size: 500, ..Default::default() });
        let nack = DlInfoListElement { rnti: 1, harq_process_id: id, harq_status: vec![HarqStatus::Nack] };
        let out = s.run(vec![nack]);

        // Only the retransmission, the UE gets no new data in the same TTI
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.rbgs(), first[0].dci.rbgs());
        assert_eq!(out[0].dci.ndi, vec![0]);
        assert_eq!(out[0].dci.rv, vec![1]);
        assert_eq!(out[0].dci.tbs_size, first[0].dci.tbs_size);
        assert_eq!(out[0].rlc_pdu_list, first[0].rlc_pdu_list);
    }

    #[test]
    fn test_ack_frees_process() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let first = s.run(vec![]);
        let id = first[0].dci.harq_process;
        assert!(s.harq.is_busy(1, id));
        let ack = DlInfoListElement { rnti: 1, harq_process_id: id, harq_status: vec![HarqStatus::Ack] };
        assert!(s.run(vec![ack]).is_empty());
        assert!(!s.harq.is_busy(1, id));
    }

    #[test]
    fn test_acked_layer_carries_empty_tb() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::SpatialMuxClosedLoop, 15, 500);
        let first = s.run(vec![]);
        let id = first[0].dci.harq_process;
        let fb = DlInfoListElement { rnti: 1, harq_process_id: id, harq_status: vec![HarqStatus::Ack, HarqStatus::Nack] };
        let out = s.run(vec![fb]);
        assert_eq!(out[0].dci.ndi, vec![0, 0]);
        assert_eq!(out[0].dci.rv, vec![0, 1]);
        assert_eq!(out[0].dci.mcs[0], 0);
        assert_eq!(out[0].dci.tbs_size[0], 0);
        assert_eq!(out[0].dci.tbs_size[1], first[0].dci.tbs_size[1]);
        assert_eq!(out[0].rlc_pdu_list[0][0].size, 0);
        assert_eq!(out[0].rlc_pdu_list[0][1], first[0].rlc_pdu_list[0][1]);
    }

    #[test]
    fn test_retx_moves_when_rbgs_taken() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        s.add_ue(2, TxMode::Siso, 15, 500);
        let first = s.run(vec![]);
        let ue1 = first.iter().find(|e| e.rnti == 1).unwrap().clone();
        let ue2 = first.iter().find(|e| e.rnti == 2).unwrap().clone();
        assert_eq!(ue1.dci.rbgs(), vec![0, 1, 2]);
        assert_eq!(ue2.dci.rbgs(), vec![3, 4, 5]);

        // Both NACK in the same TTI, retransmissions stay disjoint
        let fb = vec![
            DlInfoListElement { rnti: 2, harq_process_id: ue2.dci.harq_process, harq_status: vec![HarqStatus::Nack] },
            DlInfoListElement { rnti: 1, harq_process_id: ue1.dci.harq_process, harq_status: vec![HarqStatus::Nack] },
        ];
        let out = s.run(fb);
        assert_eq!(out.len(), 2);
        let mut seen = BTreeSet::new();
        for e in &out {
            for rbg in e.dci.rbgs() {
                assert!(seen.insert(rbg), "rbg {} assigned twice", rbg);
            }
        }
    }

    #[test]
    fn test_harq_disabled_ignores_feedback() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.harq = DlHarqManager::new(false);
        s.add_ue(1, TxMode::Siso, 15, 100_000);
        let first = s.run(vec![]);
        assert_eq!(first[0].dci.harq_process, 0);
        let nack = DlInfoListElement { rnti: 1, harq_process_id: 0, harq_status: vec![HarqStatus::Nack] };
        let out = s.run(vec![nack]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.ndi, vec![1]);
        assert_eq!(out[0].dci.harq_process, 0);
    }

    #[test]
    fn test_unknown_rnti_feedback_dropped() {
        let mut s = setup(PolicyKind::RoundRobin);
        let fb = DlInfoListElement { rnti: 99, harq_process_id: 0, harq_status: vec![HarqStatus::Nack] };
        assert!(s.run(vec![fb]).is_empty());
        assert!(s.engine.pending_feedback().is_empty());
    }

    #[test]
    fn test_nack_for_unused_process_ignored() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let nack = DlInfoListElement { rnti: 1, harq_process_id: 5, harq_status: vec![HarqStatus::Nack] };
        let out = s.run(vec![nack]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.ndi, vec![1]);
        assert_ne!(out[0].dci.harq_process, 5);
        assert!(s.engine.pending_feedback().is_empty());
    }

    #[test]
    fn test_buffered_nack_dropped_on_timeout() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let id = s.run(vec![])[0].dci.harq_process;
        for _ in 0..HARQ_DL_TIMEOUT - 1 {
            assert!(s.run(vec![]).is_empty());
        }
        assert!(s.harq.is_busy(1, id));

        // Still waiting for room when the process expires
        s.engine.pending_feedback.push(DlInfoListElement { rnti: 1, harq_process_id: id, harq_status: vec![HarqStatus::Nack] });
        s.ues.set_rlc_buffer(FlowId::new(1, 3), RlcBufferStatus { tx_queue_size: 500, ..Default::default() });
        let out = s.run(vec![]);
        assert!(!s.harq.is_busy(1, id));
        assert!(s.engine.pending_feedback().is_empty());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.ndi, vec![1]);

        s.ues.set_rlc_buffer(FlowId::new(1, 3), RlcBufferStatus { tx_queue_size: 500, ..Default::default() });
        let out = s.run(vec![]);
        assert!(out.iter().all(|e| e.dci.ndi == vec![1]));
    }

    #[test]
    fn test_ack_clears_buffered_nack() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 500);
        let a = s.run(vec![])[0].dci.harq_process;
        s.ues.set_rlc_buffer(FlowId::new(1, 3), RlcBufferStatus { tx_queue_size: 500, ..Default::default() });
        let b = s.run(vec![])[0].dci.harq_process;
        assert_ne!(a, b);

        // The NACK of b waits behind the retx of a, then b is acked in the same TTI
        let fb = vec![
            DlInfoListElement { rnti: 1, harq_process_id: a, harq_status: vec![HarqStatus::Nack] },
            DlInfoListElement { rnti: 1, harq_process_id: b, harq_status: vec![HarqStatus::Nack] },
            DlInfoListElement { rnti: 1, harq_process_id: b, harq_status: vec![HarqStatus::Ack] },
        ];
        let out = s.run(fb);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dci.harq_process, a);
        assert!(!s.harq.is_busy(1, b));
        assert!(s.engine.pending_feedback().is_empty());
    }

    #[test]
    fn test_bad_process_id_is_fatal() {
        let mut s = setup(PolicyKind::RoundRobin);
        s.add_ue(1, TxMode::Siso, 15, 0);
        let fb = DlInfoListElement { rnti: 1, harq_process_id: 12, harq_status: vec![HarqStatus::Nack] };
        let res = s.engine.schedule(&s.cell, &mut s.ues, &mut s.harq, SfnSf::default(), vec![fb]);
        assert!(matches!(res, Err(SchedErr::HarqProcessNotFound { rnti: 1, process: 12, .. })));
    }
}
