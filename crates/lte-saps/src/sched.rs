use lte_core::{Lcid, Rnti, SfnSf};

use crate::fields::build_data::{BuildDataListElement, BuildRarListElement, RachListElement};
use crate::fields::cqi::{CqiListElement, UlCqi};
use crate::fields::dci::UlDci;
use crate::fields::harq_info::{DlInfoListElement, UlInfoListElement};
use crate::fields::mac_ce::MacCeListElement;

/// RLC buffer state of one DL logical channel, replaces any earlier report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedDlRlcBufferReq {
    pub rnti: Rnti,
    pub lcid: Lcid,
    pub tx_queue_size: u32,
    pub retx_queue_size: u32,
    pub status_pdu_size: u32,
}

#[derive(Debug, Clone)]
pub struct SchedDlRachInfoReq {
    pub sfn_sf: SfnSf,
    pub rach_list: Vec<RachListElement>,
}

#[derive(Debug, Clone)]
pub struct SchedDlCqiInfoReq {
    pub sfn_sf: SfnSf,
    pub cqi_list: Vec<CqiListElement>,
}

#[derive(Debug, Clone)]
pub struct SchedUlCqiInfoReq {
    /// Subframe the measurement refers to
    pub sfn_sf: SfnSf,
    pub ul_cqi: UlCqi,
}

#[derive(Debug, Clone)]
pub struct SchedUlMacCtrlInfoReq {
    pub sfn_sf: SfnSf,
    pub mac_ce_list: Vec<MacCeListElement>,
}

/// Scheduling requests. Accepted, but grants are driven by BSRs only
#[derive(Debug, Clone)]
pub struct SchedUlSrInfoReq {
    pub sfn_sf: SfnSf,
    pub sr_list: Vec<Rnti>,
}

#[derive(Debug, Clone)]
pub struct SchedDlTriggerReq {
    pub sfn_sf: SfnSf,
    pub dl_info_list: Vec<DlInfoListElement>,
}

#[derive(Debug, Clone)]
pub struct SchedUlTriggerReq {
    pub sfn_sf: SfnSf,
    pub ul_info_list: Vec<UlInfoListElement>,
}

/// Result of a DL trigger
#[derive(Debug, Clone, Default)]
pub struct SchedDlConfigInd {
    pub build_data_list: Vec<BuildDataListElement>,
    pub build_rar_list: Vec<BuildRarListElement>,
    pub nr_of_pdcch_ofdm_symbols: u8,
}

/// Result of an UL trigger
#[derive(Debug, Clone, Default)]
pub struct SchedUlConfigInd {
    pub dci_list: Vec<UlDci>,
}
