use lte_core::{Lcid, Rnti};

use super::dci::DlDci;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlcPduListElement {
    pub lcid: Lcid,
    /// Bytes granted to this logical channel in one transport block
    pub size: u16,
}

/// DL data grant for one UE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDataListElement {
    pub rnti: Rnti,
    pub dci: DlDci,
    /// Outer index: logical channel, inner index: layer
    pub rlc_pdu_list: Vec<Vec<RlcPduListElement>>,
}

impl BuildDataListElement {
    /// Sum of all PDU sizes on all layers
    pub fn total_pdu_bytes(&self) -> u32 {
        self.rlc_pdu_list.iter().flatten().map(|pdu| pdu.size as u32).sum()
    }
}

/// Random access request as detected by the PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RachListElement {
    pub rnti: Rnti,
    /// Estimated size in bytes of the message 3 the UE wants to send
    pub estimated_size: u16,
}

/// UL grant carried in a random access response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UlGrant {
    pub rnti: Rnti,
    pub rb_start: u8,
    pub rb_len: u8,
    pub tb_size: u16,
    pub mcs: u8,
    pub hopping: bool,
    pub tpc: i8,
    pub cqi_request: bool,
    pub ul_delay: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRarListElement {
    pub rnti: Rnti,
    pub grant: UlGrant,
}
