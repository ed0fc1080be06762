use lte_core::Rnti;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarqStatus {
    Ack,
    Nack,
    Dtx,
}

/// DL HARQ feedback for one process, one status per layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlInfoListElement {
    pub rnti: Rnti,
    pub harq_process_id: u8,
    pub harq_status: Vec<HarqStatus>,
}

impl DlInfoListElement {
    /// Any layer that was not acknowledged needs a retransmission
    pub fn is_nack(&self) -> bool {
        self.harq_status.iter().any(|s| *s != HarqStatus::Ack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionStatus {
    Ok,
    NotOk,
    NotValid,
}

/// UL HARQ feedback, refers to the transmission HARQ_PERIOD TTIs back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlInfoListElement {
    pub rnti: Rnti,
    pub reception_status: ReceptionStatus,
}
