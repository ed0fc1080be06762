use std::collections::{BTreeMap, BTreeSet};

use lte_core::amc::{cqi_from_sinr, mcs_from_cqi, ul_tbs_bits};
use lte_core::{FlowId, HARQ_MAX_TX, ResourceMap, Rnti, SchedErr, SfnSf};
use lte_saps::fields::build_data::{BuildRarListElement, RachListElement, UlGrant};
use lte_saps::fields::dci::UlDci;
use lte_saps::fields::harq_info::{ReceptionStatus, UlInfoListElement};

use super::policy::{FlowCandidate, FlowSelectionPolicy, TtiSummary};
use super::subcomp::cell_config::CellConfig;
use super::subcomp::harq::UlHarqManager;
use super::subcomp::ue_registry::UeRegistry;

const TTI_SECONDS: f64 = 0.001;

/// Smallest UL block granted for new data
const MIN_UL_RBS: usize = 3;

/// MCS of a single RB, 0 without any SINR report for the UE
fn rb_mcs(ues: &UeRegistry, rnti: Rnti, rb: usize) -> u8 {
    ues.worst_ul_sinr(rnti, rb..rb + 1)
        .map_or(0, |sinr| mcs_from_cqi(cqi_from_sinr(sinr)))
}

/// Outcome of the policy walk over the free RBs
struct UlNeeds {
    /// RBs each UE would need, as distributed by the policy
    rbs: BTreeMap<Rnti, usize>,
    last: Option<(FlowId, bool)>,
    last_held_all: bool,
}

/// Uplink allocation over the flat RB range of one TTI: RACH grants first, then HARQ
/// retransmissions, then one contiguous block per UE with buffered data
pub struct UlEngine {
    policy: Box<dyn FlowSelectionPolicy>,
    /// UE the next new-data round starts with
    next_rnti: Option<Rnti>,
    /// Random access grants handed out in the last DL trigger, honored by the next UL trigger
    rach_grants: Vec<UlGrant>,
    /// RB owners per packed subframe id, consumed by PUSCH SINR reports
    alloc_records: BTreeMap<u16, Vec<Option<Rnti>>>,
}

impl UlEngine {
    pub fn new(policy: Box<dyn FlowSelectionPolicy>) -> Self {
        Self {
            policy,
            next_rnti: None,
            rach_grants: Vec::new(),
            alloc_records: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &dyn FlowSelectionPolicy {
        self.policy.as_ref()
    }

    pub fn policy_mut(&mut self) -> &mut dyn FlowSelectionPolicy {
        self.policy.as_mut()
    }

    /// Takes the RB allocation of a past subframe. Each record can be taken once.
    pub fn take_alloc_record(&mut self, sfn_sf: SfnSf) -> Option<Vec<Option<Rnti>>> {
        self.alloc_records.remove(&sfn_sf.to_u16())
    }

    ///////// RANDOM ACCESS /////////

    /// Forgets grants not yet honored, for instance after the UL band changed
    pub fn drop_rach_grants(&mut self) {
        if !self.rach_grants.is_empty() {
            tracing::debug!("dropping {} pending rach grants", self.rach_grants.len());
            self.rach_grants.clear();
        }
    }

    /// Computes the UL grants of the random access responses. Each grant starts at the
    /// lowest RB not yet reserved and uses the fewest RBs whose TB at the default UL
    /// grant MCS carries the estimated message size.
    pub fn build_rar_grants(&mut self, cell: &CellConfig, rach_list: Vec<RachListElement>) -> Vec<BuildRarListElement> {
        let num_rbs = cell.ul_rb_num();
        let mcs = cell.ul_grant_mcs;
        let mut rb_start = self
            .rach_grants
            .iter()
            .map(|g| g.rb_start as usize + g.rb_len as usize)
            .max()
            .unwrap_or(0);

        let mut rar_list = Vec::new();
        for rach in rach_list {
            let needed = rach.estimated_size as u32;
            let Some(rb_len) = (1..=num_rbs.saturating_sub(rb_start)).find(|&len| ul_tbs_bits(mcs, len) / 8 >= needed) else {
                tracing::warn!("no ul room for rach of rnti {}, {} bytes from rb {}", rach.rnti, needed, rb_start);
                break;
            };
            let grant = UlGrant {
                rnti: rach.rnti,
                rb_start: rb_start as u8,
                rb_len: rb_len as u8,
                tb_size: (ul_tbs_bits(mcs, rb_len) / 8) as u16,
                mcs,
                hopping: false,
                tpc: 0,
                cqi_request: false,
                ul_delay: false,
            };
            tracing::debug!("rar grant rnti {} rbs {}+{} tb {}", grant.rnti, grant.rb_start, grant.rb_len, grant.tb_size);
            rb_start += rb_len;
            self.rach_grants.push(grant);
            rar_list.push(BuildRarListElement { rnti: rach.rnti, grant });
        }
        rar_list
    }

    pub fn schedule(
        &mut self,
        cell: &CellConfig,
        ues: &mut UeRegistry,
        harq: &mut UlHarqManager,
        sfn_sf: SfnSf,
        feedback: Vec<UlInfoListElement>,
    ) -> Result<Vec<UlDci>, SchedErr> {
        ues.refresh_ul_cqi();
        ues.refresh_bsr();
        harq.advance();

        let mut rb_map = ResourceMap::new(cell.ul_rb_num());
        let mut served = BTreeSet::new();

        // Reservations made while answering random access
        for grant in std::mem::take(&mut self.rach_grants) {
            if let Err(e) = rb_map.reserve_range(grant.rb_start as usize, grant.rb_len as usize, grant.rnti) {
                tracing::warn!("rach grant of rnti {} not honored: {:?}", grant.rnti, e);
                continue;
            }
            if harq.has_ue(grant.rnti) {
                let dci = UlDci {
                    rnti: grant.rnti,
                    rb_start: grant.rb_start,
                    rb_len: grant.rb_len,
                    tb_size: grant.tb_size,
                    mcs: grant.mcs,
                    ndi: 1,
                    tpc: grant.tpc,
                    cqi_request: grant.cqi_request,
                    hopping: grant.hopping,
                };
                harq.record_transmission(grant.rnti, dci)?;
            }
            served.insert(grant.rnti);
        }

        let mut dci_list = self.process_harq_feedback(harq, feedback, &mut rb_map, &mut served)?;
        let mut new_data = self.allocate_new_data(ues, harq, &mut rb_map, &served)?;
        dci_list.append(&mut new_data);

        tracing::debug!(sf = %sfn_sf, "ul rbs [{}], {} grants", rb_map.dump(), dci_list.len());
        self.alloc_records.insert(sfn_sf.to_u16(), rb_map.owners().to_vec());
        Ok(dci_list)
    }

    ///////// HARQ RETRANSMISSIONS /////////

    fn process_harq_feedback(
        &mut self,
        harq: &mut UlHarqManager,
        feedback: Vec<UlInfoListElement>,
        rb_map: &mut ResourceMap,
        served: &mut BTreeSet<Rnti>,
    ) -> Result<Vec<UlDci>, SchedErr> {
        if !harq.is_enabled() {
            if !feedback.is_empty() {
                tracing::trace!("harq disabled, discarding {} ul feedback elements", feedback.len());
            }
            return Ok(Vec::new());
        }

        let mut retx_list = Vec::new();
        for fb in feedback {
            let rnti = fb.rnti;
            if !harq.has_ue(rnti) {
                tracing::warn!("ul harq feedback for unknown rnti {}", rnti);
                continue;
            }
            let id = harq.feedback_id(rnti)?;
            match fb.reception_status {
                ReceptionStatus::Ok => {
                    harq.release(rnti, id)?;
                    continue;
                }
                ReceptionStatus::NotValid => {
                    tracing::trace!("ul harq feedback of rnti {} not valid", rnti);
                    continue;
                }
                ReceptionStatus::NotOk => {}
            }

            let Some((dci, retx_count)) = harq.process(rnti, id)? else {
                tracing::warn!("ul nack for empty process {} of rnti {}, ignored", id, rnti);
                continue;
            };
            let mut dci = dci.clone();
            if retx_count + 1 >= HARQ_MAX_TX {
                tracing::debug!("ul harq rnti {} process {} failed {} times, dropped", rnti, id, retx_count + 1);
                harq.release(rnti, id)?;
                continue;
            }
            if served.contains(&rnti) {
                tracing::debug!("rnti {} already granted this tti, ul retx of process {} lost", rnti, id);
                harq.release(rnti, id)?;
                continue;
            }

            // Synchronous HARQ cannot wait, a retransmission without room is lost
            let len = dci.rb_len as usize;
            let start = if rb_map.is_free_range(dci.rb_start as usize, len) {
                dci.rb_start as usize
            } else if let Some(start) = rb_map.find_free_run(len) {
                start
            } else {
                tracing::debug!("no room for ul retx of rnti {} process {}", rnti, id);
                harq.release(rnti, id)?;
                continue;
            };
            if let Err(e) = rb_map.reserve_range(start, len, rnti) {
                tracing::warn!("ul retx of rnti {} not reserved: {:?}", rnti, e);
                continue;
            }

            dci.rb_start = start as u8;
            dci.ndi = 0;
            tracing::debug!("ul retx rnti {} rbs {}+{} retx {}", rnti, dci.rb_start, dci.rb_len, retx_count + 1);
            harq.record_retransmission(rnti, id, dci.clone())?;
            served.insert(rnti);
            retx_list.push(dci);
        }
        Ok(retx_list)
    }

    ///////// NEW DATA /////////

    /// Pass one: lets the policy hand out the free RBs one at a time to get the
    /// number of RBs each UE needs for its buffer
    fn compute_needs(&mut self, ues: &UeRegistry, rb_map: &ResourceMap, candidates_rnti: &[Rnti]) -> UlNeeds {
        let mut rbs: BTreeMap<Rnti, usize> = BTreeMap::new();
        let mut min_mcs: BTreeMap<Rnti, u8> = BTreeMap::new();
        let mut satisfied: BTreeSet<Rnti> = BTreeSet::new();
        let mut last: Option<FlowId> = None;

        for rb in 0..rb_map.len() {
            if !rb_map.is_free(rb) {
                continue;
            }
            let candidates: Vec<FlowCandidate> = candidates_rnti
                .iter()
                .filter(|rnti| !satisfied.contains(*rnti))
                .map(|&rnti| FlowCandidate {
                    flow: FlowId::ue(rnti),
                    achievable_rate: (ul_tbs_bits(rb_mcs(ues, rnti, rb), 1) / 8) as f64 / TTI_SECONDS,
                })
                .collect();
            let Some(flow) = self.policy.select_next(&candidates, rb) else {
                continue;
            };

            let rnti = flow.rnti;
            let need = rbs.entry(rnti).or_default();
            *need += 1;
            let mcs_here = rb_mcs(ues, rnti, rb);
            let mcs = min_mcs.entry(rnti).or_insert(mcs_here);
            *mcs = (*mcs).min(mcs_here);
            let is_satisfied = ul_tbs_bits(*mcs, *need) / 8 >= ues.bsr(rnti);
            if is_satisfied {
                satisfied.insert(rnti);
            }
            self.policy.on_assigned(flow, rb, is_satisfied);
            last = Some(flow);
        }

        UlNeeds {
            last: last.map(|flow| (flow, satisfied.contains(&flow.rnti))),
            last_held_all: last.is_some_and(|flow| rbs.get(&flow.rnti) == Some(&rb_map.len())),
            rbs,
        }
    }

    /// Pass two: one contiguous block per UE, visiting each UE at most once and starting
    /// with the UE that ran out of room in the previous TTI
    fn allocate_new_data(
        &mut self,
        ues: &mut UeRegistry,
        harq: &mut UlHarqManager,
        rb_map: &mut ResourceMap,
        served: &BTreeSet<Rnti>,
    ) -> Result<Vec<UlDci>, SchedErr> {
        let ues_bsr: Vec<Rnti> = ues.ues_with_bsr().into_iter().filter(|rnti| !served.contains(rnti)).collect();
        if ues_bsr.is_empty() {
            self.policy.end_tti(&TtiSummary::default());
            return Ok(Vec::new());
        }

        let needs = self.compute_needs(ues, rb_map, &ues_bsr);
        let mut summary = TtiSummary {
            last: needs.last,
            last_held_all: needs.last_held_all,
            ..Default::default()
        };

        let start_idx = self
            .next_rnti
            .and_then(|next| ues_bsr.iter().position(|&rnti| rnti >= next))
            .unwrap_or(0);
        let mut dci_list = Vec::new();
        let mut exhausted = false;
        let mut last_visited = None;

        for round in 0..ues_bsr.len() {
            let rnti = ues_bsr[(start_idx + round) % ues_bsr.len()];
            let mut rb_len = needs.rbs.get(&rnti).copied().unwrap_or(0).max(MIN_UL_RBS);
            let rb_start = match rb_map.find_free_run(rb_len) {
                Some(start) => start,
                None => match rb_map.largest_free_run() {
                    Some((start, len)) if len >= MIN_UL_RBS => {
                        rb_len = len;
                        start
                    }
                    _ => {
                        tracing::debug!("ul rbs exhausted, rnti {} goes first next tti", rnti);
                        self.next_rnti = Some(rnti);
                        exhausted = true;
                        break;
                    }
                },
            };
            last_visited = Some(rnti);
            if let Err(e) = rb_map.reserve_range(rb_start, rb_len, rnti) {
                tracing::warn!("ul block of rnti {} not reserved: {:?}", rnti, e);
                continue;
            }

            let mcs = match ues.worst_ul_sinr(rnti, rb_start..rb_start + rb_len) {
                None => 0,
                Some(sinr) => {
                    let cqi = cqi_from_sinr(sinr);
                    if cqi == 0 {
                        tracing::debug!("ul cqi 0 for rnti {} on rbs {}+{}, skipped", rnti, rb_start, rb_len);
                        if let Err(e) = rb_map.release_range(rb_start, rb_len) {
                            tracing::warn!("ul block of rnti {} not released: {:?}", rnti, e);
                        }
                        continue;
                    }
                    mcs_from_cqi(cqi)
                }
            };

            let tb_size = ul_tbs_bits(mcs, rb_len) / 8;
            let dci = UlDci {
                rnti,
                rb_start: rb_start as u8,
                rb_len: rb_len as u8,
                tb_size: tb_size as u16,
                mcs,
                ndi: 1,
                tpc: 0,
                cqi_request: false,
                hopping: false,
            };
            tracing::debug!("ul grant rnti {} rbs {}+{} mcs {} tb {} bsr {}", rnti, rb_start, rb_len, mcs, tb_size, ues.bsr(rnti));
            harq.record_transmission(rnti, dci.clone())?;
            ues.update_ul_bsr(rnti, tb_size);
            summary.bytes.insert(FlowId::ue(rnti), tb_size);
            dci_list.push(dci);
        }

        if !exhausted {
            if let Some(rnti) = last_visited {
                self.next_rnti = Some(rnti.wrapping_add(1));
            }
        }
        self.policy.end_tti(&summary);
        Ok(dci_list)
    }
}
