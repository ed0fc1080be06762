use std::collections::BTreeMap;

use lte_core::{FlowId, Lcid, NO_SINR, Rnti, SchedErr, TxMode, assert_warn};
use lte_saps::fields::lc_config::LogicalChannelConfig;

/// RLC header overhead subtracted from a PDU before it drains the new-data queue
fn rlc_overhead(lcid: Lcid) -> u32 {
    if lcid == 1 { 4 } else { 2 }
}

/// Overhead subtracted from an UL grant before it drains the reported buffer
const UL_RLC_OVERHEAD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RlcBufferStatus {
    pub tx_queue_size: u32,
    pub retx_queue_size: u32,
    pub status_pdu_size: u32,
}

impl RlcBufferStatus {
    /// Total bytes waiting on this logical channel
    pub fn pending(&self) -> u32 {
        self.tx_queue_size
            .saturating_add(self.retx_queue_size)
            .saturating_add(self.status_pdu_size)
    }
}

#[derive(Debug, Clone)]
pub struct UeContext {
    pub tx_mode: TxMode,
}

/// A report with its expiry counter
#[derive(Debug, Clone)]
struct Timed<T> {
    value: T,
    timer: u32,
}

/// Ages all entries by one TTI and purges the expired ones. Returns the purged keys.
fn age_entries<T>(map: &mut BTreeMap<Rnti, Timed<T>>) -> Vec<Rnti> {
    let mut expired = Vec::new();
    map.retain(|rnti, entry| {
        entry.timer = entry.timer.saturating_sub(1);
        if entry.timer == 0 {
            expired.push(*rnti);
            false
        } else {
            true
        }
    });
    expired
}

/// Per-UE state: transmission mode, logical channels, buffer state and channel quality
pub struct UeRegistry {
    ues: BTreeMap<Rnti, UeContext>,
    lcs: BTreeMap<FlowId, LogicalChannelConfig>,
    rlc_buffers: BTreeMap<FlowId, RlcBufferStatus>,
    /// Buffered UL bytes per UE, aged with the same threshold as the CQI tables
    bsr: BTreeMap<Rnti, Timed<u32>>,

    /// Wideband CQI per layer
    dl_wb_cqi: BTreeMap<Rnti, Timed<Vec<u8>>>,
    /// Subband CQI, indexed [rbg][layer]
    dl_sb_cqi: BTreeMap<Rnti, Timed<Vec<Vec<u8>>>>,
    /// SINR in dB per UL RB, NO_SINR where unknown
    ul_sinr: BTreeMap<Rnti, Timed<Vec<f64>>>,

    cqi_timer_threshold: u32,
}

impl UeRegistry {
    pub fn new(cqi_timer_threshold: u32) -> Self {
        Self {
            ues: BTreeMap::new(),
            lcs: BTreeMap::new(),
            rlc_buffers: BTreeMap::new(),
            bsr: BTreeMap::new(),
            dl_wb_cqi: BTreeMap::new(),
            dl_sb_cqi: BTreeMap::new(),
            ul_sinr: BTreeMap::new(),
            cqi_timer_threshold,
        }
    }

    ///////// UE AND LOGICAL CHANNEL LIFECYCLE /////////

    /// Adds a UE, or updates the transmission mode of a known one. Returns true if the UE is new.
    pub fn add_ue(&mut self, rnti: Rnti, tx_mode: TxMode) -> bool {
        match self.ues.get_mut(&rnti) {
            Some(ue) => {
                tracing::debug!("ue {} tx mode {:?} -> {:?}", rnti, ue.tx_mode, tx_mode);
                ue.tx_mode = tx_mode;
                false
            }
            None => {
                tracing::debug!("ue {} added, tx mode {:?}", rnti, tx_mode);
                self.ues.insert(rnti, UeContext { tx_mode });
                true
            }
        }
    }

    /// Removes the UE and everything keyed by it. Returns the logical channels it had.
    pub fn remove_ue(&mut self, rnti: Rnti) -> Vec<Lcid> {
        let lcids = self.lcids(rnti);
        self.ues.remove(&rnti);
        self.lcs.retain(|flow, _| flow.rnti != rnti);
        self.rlc_buffers.retain(|flow, _| flow.rnti != rnti);
        self.bsr.remove(&rnti);
        self.dl_wb_cqi.remove(&rnti);
        self.dl_sb_cqi.remove(&rnti);
        self.ul_sinr.remove(&rnti);
        lcids
    }

    pub fn has_ue(&self, rnti: Rnti) -> bool {
        self.ues.contains_key(&rnti)
    }

    pub fn rntis(&self) -> impl Iterator<Item = Rnti> + '_ {
        self.ues.keys().copied()
    }

    /// Number of spatial layers used for the UE, 1 if unknown
    pub fn num_layers(&self, rnti: Rnti) -> usize {
        self.ues.get(&rnti).map_or(1, |ue| ue.tx_mode.num_layers())
    }

    pub fn add_lc(&mut self, rnti: Rnti, cfg: LogicalChannelConfig) -> Result<(), SchedErr> {
        if !self.has_ue(rnti) {
            return Err(SchedErr::UeContextMissing { rnti });
        }
        let flow = FlowId::new(rnti, cfg.lcid);
        tracing::debug!("lc {} configured, gbr dl {} ul {}", flow, cfg.gbr_dl, cfg.gbr_ul);
        self.lcs.insert(flow, cfg);
        Ok(())
    }

    /// Returns false if the logical channel was not configured
    pub fn remove_lc(&mut self, rnti: Rnti, lcid: Lcid) -> bool {
        let flow = FlowId::new(rnti, lcid);
        self.rlc_buffers.remove(&flow);
        self.lcs.remove(&flow).is_some()
    }

    pub fn has_lc(&self, flow: FlowId) -> bool {
        self.lcs.contains_key(&flow)
    }

    pub fn lc_config(&self, flow: FlowId) -> Option<&LogicalChannelConfig> {
        self.lcs.get(&flow)
    }

    pub fn lcids(&self, rnti: Rnti) -> Vec<Lcid> {
        self.lcs.keys().filter(|f| f.rnti == rnti).map(|f| f.lcid).collect()
    }

    ///////// DL RLC BUFFERS /////////

    /// Replaces the buffer state of the flow
    pub fn set_rlc_buffer(&mut self, flow: FlowId, status: RlcBufferStatus) {
        self.rlc_buffers.insert(flow, status);
    }

    pub fn rlc_buffer(&self, flow: FlowId) -> Option<&RlcBufferStatus> {
        self.rlc_buffers.get(&flow)
    }

    /// Flows with pending DL data, in (RNTI, LCID) order
    pub fn dl_flows_with_data(&self) -> Vec<FlowId> {
        self.rlc_buffers
            .iter()
            .filter(|(_, b)| b.pending() > 0)
            .map(|(flow, _)| *flow)
            .collect()
    }

    /// Drains `size` granted bytes from the buffers of the flow: status PDUs first,
    /// then retransmissions, then new data minus the RLC header overhead
    pub fn update_dl_rlc_buffer(&mut self, flow: FlowId, size: u32) -> Result<(), SchedErr> {
        let buf = self.rlc_buffers.get_mut(&flow).ok_or(SchedErr::RlcBufferMissing { flow })?;

        let mut remaining = size;
        if buf.status_pdu_size > 0 {
            let used = buf.status_pdu_size.min(remaining);
            buf.status_pdu_size -= used;
            remaining -= used;
        }
        if remaining > 0 && buf.retx_queue_size > 0 {
            let used = buf.retx_queue_size.min(remaining);
            buf.retx_queue_size -= used;
            remaining -= used;
        }
        if remaining > 0 && buf.tx_queue_size > 0 {
            let payload = remaining.saturating_sub(rlc_overhead(flow.lcid));
            buf.tx_queue_size = buf.tx_queue_size.saturating_sub(payload);
        }

        tracing::trace!("rlc buffer {} after {} bytes: {:?}", flow, size, buf);
        Ok(())
    }

    ///////// UL BUFFER STATUS /////////

    pub fn set_bsr(&mut self, rnti: Rnti, bytes: u32) {
        let timer = self.cqi_timer_threshold;
        self.bsr.insert(rnti, Timed { value: bytes, timer });
    }

    pub fn bsr(&self, rnti: Rnti) -> u32 {
        self.bsr.get(&rnti).map_or(0, |e| e.value)
    }

    /// UEs with a nonzero buffer status report, in RNTI order
    pub fn ues_with_bsr(&self) -> Vec<Rnti> {
        self.bsr.iter().filter(|(_, e)| e.value > 0).map(|(r, _)| *r).collect()
    }

    /// Decrements the reported buffer by a granted transport block
    pub fn update_ul_bsr(&mut self, rnti: Rnti, tb_size: u32) {
        if let Some(entry) = self.bsr.get_mut(&rnti) {
            entry.value = entry.value.saturating_sub(tb_size.saturating_sub(UL_RLC_OVERHEAD));
        }
    }

    ///////// CHANNEL QUALITY /////////

    pub fn set_dl_wideband_cqi(&mut self, rnti: Rnti, cqi: Vec<u8>) {
        let timer = self.cqi_timer_threshold;
        self.dl_wb_cqi.insert(rnti, Timed { value: cqi, timer });
    }

    pub fn set_dl_subband_cqi(&mut self, rnti: Rnti, sb_cqi: Vec<Vec<u8>>) {
        let timer = self.cqi_timer_threshold;
        self.dl_sb_cqi.insert(rnti, Timed { value: sb_cqi, timer });
    }

    /// CQI of one RBG and layer. Subband reports take precedence over wideband ones;
    /// without any valid report the lowest usable CQI 1 is assumed.
    pub fn dl_cqi(&self, rnti: Rnti, rbg: usize, layer: usize) -> u8 {
        let per_layer = |v: &Vec<u8>| v.get(layer).or(v.first()).copied();
        if let Some(cqi) = self.dl_sb_cqi.get(&rnti).and_then(|sb| sb.value.get(rbg)).and_then(per_layer) {
            return cqi;
        }
        if let Some(cqi) = self.dl_wb_cqi.get(&rnti).and_then(|wb| per_layer(&wb.value)) {
            return cqi;
        }
        1
    }

    pub fn has_dl_cqi(&self, rnti: Rnti) -> bool {
        self.dl_wb_cqi.contains_key(&rnti) || self.dl_sb_cqi.contains_key(&rnti)
    }

    /// Replaces the whole SINR vector of the UE
    pub fn set_ul_sinr(&mut self, rnti: Rnti, sinr: Vec<f64>) {
        let timer = self.cqi_timer_threshold;
        self.ul_sinr.insert(rnti, Timed { value: sinr, timer });
    }

    /// Updates the SINR of a single RB, creating an all-unknown vector of `num_rbs` if needed
    pub fn set_ul_sinr_rb(&mut self, rnti: Rnti, rb: usize, sinr: f64, num_rbs: usize) {
        let timer = self.cqi_timer_threshold;
        let entry = self.ul_sinr.entry(rnti).or_insert_with(|| Timed { value: vec![NO_SINR; num_rbs], timer });
        assert_warn!(rb < entry.value.len(), "rb {} outside SINR vector of rnti {}", rb, rnti);
        if let Some(v) = entry.value.get_mut(rb) {
            *v = sinr;
        }
        entry.timer = timer;
    }

    pub fn ul_sinr(&self, rnti: Rnti) -> Option<&[f64]> {
        self.ul_sinr.get(&rnti).map(|e| e.value.as_slice())
    }

    /// Lowest SINR over an RB range. RBs without measurement are estimated by the mean
    /// of the UE's measured RBs. None without any UL report for the UE.
    pub fn worst_ul_sinr(&self, rnti: Rnti, rbs: std::ops::Range<usize>) -> Option<f64> {
        let sinr = self.ul_sinr(rnti)?;
        let known: Vec<f64> = sinr.iter().copied().filter(|s| *s != NO_SINR).collect();
        let estimate = if known.is_empty() {
            NO_SINR
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        };
        rbs.map(|rb| match sinr.get(rb) {
            Some(s) if *s != NO_SINR => *s,
            _ => estimate,
        })
        .reduce(f64::min)
    }

    /// Ages DL CQI reports by one TTI
    pub fn refresh_dl_cqi(&mut self) {
        for rnti in age_entries(&mut self.dl_wb_cqi) {
            tracing::debug!("wideband cqi of rnti {} expired", rnti);
        }
        for rnti in age_entries(&mut self.dl_sb_cqi) {
            tracing::debug!("subband cqi of rnti {} expired", rnti);
        }
    }

    /// Ages UL SINR reports by one TTI
    pub fn refresh_ul_cqi(&mut self) {
        for rnti in age_entries(&mut self.ul_sinr) {
            tracing::debug!("ul sinr of rnti {} expired", rnti);
        }
    }

    /// Ages buffer status reports by one TTI. A grant does not refresh the entry.
    pub fn refresh_bsr(&mut self) {
        for rnti in age_entries(&mut self.bsr) {
            tracing::debug!("bsr of rnti {} expired", rnti);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_flow(lcid: Lcid) -> (UeRegistry, FlowId) {
        let mut reg = UeRegistry::new(3);
        reg.add_ue(1, TxMode::Siso);
        reg.add_lc(1, LogicalChannelConfig::new(lcid, 0, 0)).unwrap();
        (reg, FlowId::new(1, lcid))
    }

    #[test]
    fn test_lc_for_unknown_ue() {
        let mut reg = UeRegistry::new(10);
        assert_eq!(reg.add_lc(5, LogicalChannelConfig::new(3, 0, 0)), Err(SchedErr::UeContextMissing { rnti: 5 }));
    }

    #[test]
    fn test_rlc_drain_order() {
        let (mut reg, flow) = registry_with_flow(3);
        reg.set_rlc_buffer(flow, RlcBufferStatus { tx_queue_size: 100, retx_queue_size: 30, status_pdu_size: 10 });

        reg.update_dl_rlc_buffer(flow, 25).unwrap();
        assert_eq!(reg.rlc_buffer(flow), Some(&RlcBufferStatus { tx_queue_size: 100, retx_queue_size: 15, status_pdu_size: 0 }));

        // 15 retx, then 52 - 15 - 2 header bytes of new data
        reg.update_dl_rlc_buffer(flow, 52).unwrap();
        assert_eq!(reg.rlc_buffer(flow), Some(&RlcBufferStatus { tx_queue_size: 65, retx_queue_size: 0, status_pdu_size: 0 }));

        reg.update_dl_rlc_buffer(flow, 1000).unwrap();
        assert_eq!(reg.rlc_buffer(flow).map(|b| b.pending()), Some(0));
    }

    #[test]
    fn test_rlc_overhead_srb1() {
        let (mut reg, flow) = registry_with_flow(1);
        reg.set_rlc_buffer(flow, RlcBufferStatus { tx_queue_size: 100, ..Default::default() });
        reg.update_dl_rlc_buffer(flow, 50).unwrap();
        assert_eq!(reg.rlc_buffer(flow).unwrap().tx_queue_size, 54);
    }

    #[test]
    fn test_rlc_buffer_missing() {
        let (mut reg, flow) = registry_with_flow(3);
        assert_eq!(reg.update_dl_rlc_buffer(flow, 10), Err(SchedErr::RlcBufferMissing { flow }));
    }

    #[test]
    fn test_ul_bsr_decrement_clamps() {
        let (mut reg, _) = registry_with_flow(3);
        reg.set_bsr(1, 100);
        reg.update_ul_bsr(1, 52);
        assert_eq!(reg.bsr(1), 50);
        reg.update_ul_bsr(1, 500);
        assert_eq!(reg.bsr(1), 0);
        assert!(reg.ues_with_bsr().is_empty());
    }

    #[test]
    fn test_bsr_expires() {
        let (mut reg, _) = registry_with_flow(3);
        reg.set_bsr(1, 100);
        reg.refresh_bsr();
        reg.update_ul_bsr(1, 12);
        reg.refresh_bsr();
        assert_eq!(reg.bsr(1), 90);
        reg.refresh_bsr();
        assert_eq!(reg.bsr(1), 0);
        assert!(reg.ues_with_bsr().is_empty());

        // A new report starts over
        reg.set_bsr(1, 40);
        reg.refresh_bsr();
        reg.refresh_bsr();
        assert_eq!(reg.ues_with_bsr(), vec![1]);
    }

    #[test]
    fn test_dl_cqi_precedence_and_expiry() {
        let (mut reg, _) = registry_with_flow(3);
        assert_eq!(reg.dl_cqi(1, 0, 0), 1);

        reg.set_dl_wideband_cqi(1, vec![9]);
        reg.set_dl_subband_cqi(1, vec![vec![4], vec![12]]);
        assert_eq!(reg.dl_cqi(1, 0, 0), 4);
        assert_eq!(reg.dl_cqi(1, 1, 0), 12);
        // Past the subband vector, and on a second layer, fall back to what is known
        assert_eq!(reg.dl_cqi(1, 5, 0), 9);
        assert_eq!(reg.dl_cqi(1, 5, 1), 9);

        reg.refresh_dl_cqi();
        reg.refresh_dl_cqi();
        assert!(reg.has_dl_cqi(1));
        reg.refresh_dl_cqi();
        assert!(!reg.has_dl_cqi(1));
        assert_eq!(reg.dl_cqi(1, 0, 0), 1);
    }

    #[test]
    fn test_worst_ul_sinr_estimates_missing() {
        let (mut reg, _) = registry_with_flow(3);
        assert_eq!(reg.worst_ul_sinr(1, 0..3), None);

        reg.set_ul_sinr_rb(1, 2, 10.0, 6);
        reg.set_ul_sinr_rb(1, 3, 20.0, 6);
        // RB 0 and 1 are estimated at the mean of 10 and 20
        assert_eq!(reg.worst_ul_sinr(1, 0..2), Some(15.0));
        assert_eq!(reg.worst_ul_sinr(1, 0..4), Some(10.0));

        reg.set_ul_sinr(1, vec![NO_SINR; 6]);
        assert_eq!(reg.worst_ul_sinr(1, 0..2), Some(NO_SINR));
    }

    #[test]
    fn test_remove_ue_clears_everything() {
        let (mut reg, flow) = registry_with_flow(3);
        reg.set_rlc_buffer(flow, RlcBufferStatus { tx_queue_size: 5, ..Default::default() });
        reg.set_bsr(1, 10);
        reg.set_ul_sinr(1, vec![1.0]);
        assert_eq!(reg.remove_ue(1), vec![3]);
        assert!(!reg.has_ue(1));
        assert!(reg.dl_flows_with_data().is_empty());
        assert!(reg.ues_with_bsr().is_empty());
        assert!(reg.ul_sinr(1).is_none());
    }
}
