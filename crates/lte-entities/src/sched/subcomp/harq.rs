use std::collections::BTreeMap;

use lte_core::{Direction, HARQ_DL_TIMEOUT, HARQ_ID_INVALID, HARQ_PERIOD, HARQ_PROC_NUM, Rnti, SchedErr};
use lte_saps::fields::build_data::RlcPduListElement;
use lte_saps::fields::dci::{DlDci, UlDci};

/// RLC PDUs of one transport block set, outer index logical channel, inner index layer
pub type RlcPduList = Vec<Vec<RlcPduListElement>>;

#[derive(Debug, Clone, Default)]
struct DlHarqProcess {
    busy: bool,
    /// TTIs since the last transmission
    timer: u8,
    dci: Option<DlDci>,
    rlc_pdus: Option<RlcPduList>,
}

impl DlHarqProcess {
    fn reset(&mut self) {
        self.busy = false;
        self.timer = 0;
        self.rlc_pdus = None;
    }
}

#[derive(Debug, Clone)]
struct DlUeHarq {
    last_id: u8,
    procs: Vec<DlHarqProcess>,
}

impl DlUeHarq {
    fn new() -> Self {
        Self {
            last_id: 0,
            procs: vec![DlHarqProcess::default(); HARQ_PROC_NUM as usize],
        }
    }
}

/// DL HARQ processes of all UEs. With HARQ disabled, every grant uses process 0 and
/// processes are never marked busy.
pub struct DlHarqManager {
    enabled: bool,
    ues: BTreeMap<Rnti, DlUeHarq>,
}

impl DlHarqManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, ues: BTreeMap::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_ue(&mut self, rnti: Rnti) {
        self.ues.entry(rnti).or_insert_with(DlUeHarq::new);
    }

    pub fn remove_ue(&mut self, rnti: Rnti) {
        self.ues.remove(&rnti);
    }

    pub fn has_ue(&self, rnti: Rnti) -> bool {
        self.ues.contains_key(&rnti)
    }

    fn proc(&self, rnti: Rnti, id: u8) -> Result<&DlHarqProcess, SchedErr> {
        self.ues
            .get(&rnti)
            .and_then(|ue| ue.procs.get(id as usize))
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Dl, rnti, process: id })
    }

    fn proc_mut(&mut self, rnti: Rnti, id: u8) -> Result<&mut DlHarqProcess, SchedErr> {
        self.ues
            .get_mut(&rnti)
            .and_then(|ue| ue.procs.get_mut(id as usize))
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Dl, rnti, process: id })
    }

    /// True if a new transmission can be started for the UE
    pub fn is_available(&self, rnti: Rnti) -> Result<bool, SchedErr> {
        let ue = self.ues.get(&rnti).ok_or(SchedErr::UeContextMissing { rnti })?;
        Ok(!self.enabled || ue.procs.iter().any(|p| !p.busy))
    }

    /// Takes the next free process, probing from the one after the last used.
    /// Returns HARQ_ID_INVALID if all processes are busy.
    pub fn acquire(&mut self, rnti: Rnti) -> Result<u8, SchedErr> {
        if !self.enabled {
            return Ok(0);
        }
        let ue = self.ues.get_mut(&rnti).ok_or(SchedErr::UeContextMissing { rnti })?;
        for i in 1..=HARQ_PROC_NUM {
            let id = (ue.last_id + i) % HARQ_PROC_NUM;
            let proc = &mut ue.procs[id as usize];
            if !proc.busy {
                proc.busy = true;
                ue.last_id = id;
                return Ok(id);
            }
        }
        tracing::warn!("no free dl harq process for rnti {}", rnti);
        Ok(HARQ_ID_INVALID)
    }

    /// Increments the timers of busy processes. A process without feedback for
    /// HARQ_DL_TIMEOUT TTIs is force-reset. Returns the reset (rnti, process) pairs.
    pub fn refresh(&mut self) -> Vec<(Rnti, u8)> {
        let mut expired = Vec::new();
        for (rnti, ue) in self.ues.iter_mut() {
            for (id, proc) in ue.procs.iter_mut().enumerate() {
                if !proc.busy {
                    continue;
                }
                proc.timer += 1;
                if proc.timer >= HARQ_DL_TIMEOUT {
                    tracing::debug!("dl harq timeout rnti {} process {}", rnti, id);
                    proc.reset();
                    expired.push((*rnti, id as u8));
                }
            }
        }
        expired
    }

    pub fn is_busy(&self, rnti: Rnti, id: u8) -> bool {
        self.proc(rnti, id).is_ok_and(|p| p.busy)
    }

    /// Stores a new transmission for later replay
    pub fn record_transmission(&mut self, rnti: Rnti, id: u8, dci: DlDci, rlc_pdus: RlcPduList) -> Result<(), SchedErr> {
        let proc = self.proc_mut(rnti, id)?;
        proc.timer = 0;
        proc.dci = Some(dci);
        proc.rlc_pdus = Some(rlc_pdus);
        Ok(())
    }

    /// Stores the DCI of a retransmission. The buffered PDUs are kept.
    pub fn record_retransmission(&mut self, rnti: Rnti, id: u8, dci: DlDci) -> Result<(), SchedErr> {
        let proc = self.proc_mut(rnti, id)?;
        proc.timer = 0;
        proc.dci = Some(dci);
        Ok(())
    }

    pub fn dci(&self, rnti: Rnti, id: u8) -> Result<&DlDci, SchedErr> {
        self.proc(rnti, id)?
            .dci
            .as_ref()
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Dl, rnti, process: id })
    }

    /// DCI to replay after a NACK, None if the process is idle
    pub fn pending_dci(&self, rnti: Rnti, id: u8) -> Result<Option<&DlDci>, SchedErr> {
        let proc = self.proc(rnti, id)?;
        if !proc.busy {
            return Ok(None);
        }
        proc.dci
            .as_ref()
            .map(Some)
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Dl, rnti, process: id })
    }

    pub fn rlc_pdus(&self, rnti: Rnti, id: u8) -> Result<&RlcPduList, SchedErr> {
        self.proc(rnti, id)?
            .rlc_pdus
            .as_ref()
            .ok_or(SchedErr::RlcPduListMissing { rnti, process: id })
    }

    /// Frees the process after an ACK or after the last failed transmission
    pub fn release(&mut self, rnti: Rnti, id: u8) -> Result<(), SchedErr> {
        self.proc_mut(rnti, id)?.reset();
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct UlHarqProcess {
    dci: UlDci,
    /// Retransmissions so far
    retx_count: u8,
}

#[derive(Debug, Clone)]
struct UlUeHarq {
    cur_id: u8,
    procs: Vec<Option<UlHarqProcess>>,
}

impl UlUeHarq {
    fn new() -> Self {
        Self {
            cur_id: 0,
            procs: vec![None; HARQ_PROC_NUM as usize],
        }
    }
}

/// Synchronous UL HARQ: the process in use advances once per UL trigger, and feedback
/// refers to the process used HARQ_PERIOD TTIs earlier
pub struct UlHarqManager {
    enabled: bool,
    ues: BTreeMap<Rnti, UlUeHarq>,
}

impl UlHarqManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, ues: BTreeMap::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn add_ue(&mut self, rnti: Rnti) {
        self.ues.entry(rnti).or_insert_with(UlUeHarq::new);
    }

    pub fn remove_ue(&mut self, rnti: Rnti) {
        self.ues.remove(&rnti);
    }

    pub fn has_ue(&self, rnti: Rnti) -> bool {
        self.ues.contains_key(&rnti)
    }

    /// Moves every UE to its next process. Called once at the start of each UL trigger.
    pub fn advance(&mut self) {
        if !self.enabled {
            return;
        }
        for ue in self.ues.values_mut() {
            ue.cur_id = (ue.cur_id + 1) % HARQ_PROC_NUM;
        }
    }

    pub fn current_id(&self, rnti: Rnti) -> Result<u8, SchedErr> {
        self.ues.get(&rnti).map(|ue| ue.cur_id).ok_or(SchedErr::UeContextMissing { rnti })
    }

    /// Process the current feedback for the UE refers to
    pub fn feedback_id(&self, rnti: Rnti) -> Result<u8, SchedErr> {
        let cur = self.current_id(rnti)?;
        Ok((cur + HARQ_PROC_NUM - HARQ_PERIOD) % HARQ_PROC_NUM)
    }

    fn slot_mut(&mut self, rnti: Rnti, id: u8) -> Result<&mut Option<UlHarqProcess>, SchedErr> {
        self.ues
            .get_mut(&rnti)
            .and_then(|ue| ue.procs.get_mut(id as usize))
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Ul, rnti, process: id })
    }

    /// The DCI and retransmission count stored in a process, None for an empty slot
    pub fn process(&self, rnti: Rnti, id: u8) -> Result<Option<(&UlDci, u8)>, SchedErr> {
        self.ues
            .get(&rnti)
            .and_then(|ue| ue.procs.get(id as usize))
            .map(|p| p.as_ref().map(|p| (&p.dci, p.retx_count)))
            .ok_or(SchedErr::HarqProcessNotFound { dir: Direction::Ul, rnti, process: id })
    }

    /// Stores a new transmission in the current process
    pub fn record_transmission(&mut self, rnti: Rnti, dci: UlDci) -> Result<(), SchedErr> {
        let id = self.current_id(rnti)?;
        *self.slot_mut(rnti, id)? = Some(UlHarqProcess { dci, retx_count: 0 });
        Ok(())
    }

    /// Moves a process being retransmitted into the current one, counting the retransmission
    pub fn record_retransmission(&mut self, rnti: Rnti, from_id: u8, dci: UlDci) -> Result<(), SchedErr> {
        let retx_count = self.slot_mut(rnti, from_id)?.take().map_or(0, |p| p.retx_count) + 1;
        let id = self.current_id(rnti)?;
        *self.slot_mut(rnti, id)? = Some(UlHarqProcess { dci, retx_count });
        Ok(())
    }

    pub fn release(&mut self, rnti: Rnti, id: u8) -> Result<(), SchedErr> {
        *self.slot_mut(rnti, id)? = None;
        Ok(())
    }
}
