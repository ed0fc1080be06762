use core::fmt::Display;

use lte_core::Sap;
use lte_core::SfnSf;
use lte_core::lte_entities::LteEntity;

use super::csched::*;
use super::sched::*;


/// Exhaustive list of primitives exchanged with the scheduler
#[derive(Debug)]
pub enum SapMsgInner {

    // CSCHED-SAP
    CschedCellConfigReq(CschedCellConfigReq),
    CschedUeConfigReq(CschedUeConfigReq),
    CschedLcConfigReq(CschedLcConfigReq),
    CschedLcReleaseReq(CschedLcReleaseReq),
    CschedUeReleaseReq(CschedUeReleaseReq),

    // SCHED-SAP, requests
    SchedDlRlcBufferReq(SchedDlRlcBufferReq),
    SchedDlRachInfoReq(SchedDlRachInfoReq),
    SchedDlCqiInfoReq(SchedDlCqiInfoReq),
    SchedUlCqiInfoReq(SchedUlCqiInfoReq),
    SchedUlMacCtrlInfoReq(SchedUlMacCtrlInfoReq),
    SchedUlSrInfoReq(SchedUlSrInfoReq),
    SchedDlTriggerReq(SchedDlTriggerReq),
    SchedUlTriggerReq(SchedUlTriggerReq),

    // SCHED-SAP, indications
    SchedDlConfigInd(SchedDlConfigInd),
    SchedUlConfigInd(SchedUlConfigInd),
}

impl Display for SapMsgInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SapMsgInner::CschedCellConfigReq(_) => write!(f, "CschedCellConfigReq"),
            SapMsgInner::CschedUeConfigReq(_) => write!(f, "CschedUeConfigReq"),
            SapMsgInner::CschedLcConfigReq(_) => write!(f, "CschedLcConfigReq"),
            SapMsgInner::CschedLcReleaseReq(_) => write!(f, "CschedLcReleaseReq"),
            SapMsgInner::CschedUeReleaseReq(_) => write!(f, "CschedUeReleaseReq"),

            SapMsgInner::SchedDlRlcBufferReq(_) => write!(f, "SchedDlRlcBufferReq"),
            SapMsgInner::SchedDlRachInfoReq(_) => write!(f, "SchedDlRachInfoReq"),
            SapMsgInner::SchedDlCqiInfoReq(_) => write!(f, "SchedDlCqiInfoReq"),
            SapMsgInner::SchedUlCqiInfoReq(_) => write!(f, "SchedUlCqiInfoReq"),
            SapMsgInner::SchedUlMacCtrlInfoReq(_) => write!(f, "SchedUlMacCtrlInfoReq"),
            SapMsgInner::SchedUlSrInfoReq(_) => write!(f, "SchedUlSrInfoReq"),
            SapMsgInner::SchedDlTriggerReq(_) => write!(f, "SchedDlTriggerReq"),
            SapMsgInner::SchedUlTriggerReq(_) => write!(f, "SchedUlTriggerReq"),

            SapMsgInner::SchedDlConfigInd(_) => write!(f, "SchedDlConfigInd"),
            SapMsgInner::SchedUlConfigInd(_) => write!(f, "SchedUlConfigInd"),
        }
    }
}

#[derive(Debug)]
pub struct SapMsg {
    pub sap: Sap,
    pub src: LteEntity,
    pub dest: LteEntity,
    /// Subframe at the time the message was created
    pub sfn_sf: SfnSf,

    pub msg: SapMsgInner
}

impl SapMsg {
    pub fn new(
        sap: Sap,
        src: LteEntity,
        dest: LteEntity,
        sfn_sf: SfnSf,
        msg: SapMsgInner
    ) -> Self {
        Self {
            sap,
            src,
            dest,
            sfn_sf,
            msg
        }
    }

    pub fn get_source(&self) -> &LteEntity {
        &self.src
    }
    pub fn get_dest(&self) -> &LteEntity {
        &self.dest
    }
    pub fn get_sap(&self) -> &Sap {
        &self.sap
    }
}
