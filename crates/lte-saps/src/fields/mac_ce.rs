use lte_core::Rnti;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacCeType {
    /// Buffer status report
    Bsr,
    /// Power headroom report
    Phr,
    Crnti,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MacCeValue {
    pub phr: u8,
    pub crnti: u16,
    /// BSR level index per logical channel group, 4 entries
    pub buffer_status: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacCeListElement {
    pub rnti: Rnti,
    pub ce_type: MacCeType,
    pub value: MacCeValue,
}

impl MacCeListElement {
    pub fn bsr(rnti: Rnti, buffer_status: [u8; 4]) -> Self {
        MacCeListElement {
            rnti,
            ce_type: MacCeType::Bsr,
            value: MacCeValue { buffer_status: buffer_status.to_vec(), ..Default::default() },
        }
    }
}
