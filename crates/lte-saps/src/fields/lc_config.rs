use lte_core::Lcid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosBearerType {
    NonGbr,
    Gbr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalChannelConfig {
    pub lcid: Lcid,
    /// Logical channel group, 0 to 3
    pub lcg: u8,
    pub qci: u8,
    pub qos_bearer_type: QosBearerType,
    /// Guaranteed bitrates, bit/s
    pub gbr_dl: u64,
    pub gbr_ul: u64,
    /// Maximum bitrates, bit/s
    pub mbr_dl: u64,
    pub mbr_ul: u64,
}

impl LogicalChannelConfig {
    pub fn new(lcid: Lcid, gbr_dl: u64, gbr_ul: u64) -> Self {
        let qos_bearer_type = if gbr_dl > 0 || gbr_ul > 0 { QosBearerType::Gbr } else { QosBearerType::NonGbr };
        LogicalChannelConfig {
            lcid,
            lcg: 0,
            qci: 9,
            qos_bearer_type,
            gbr_dl,
            gbr_ul,
            mbr_dl: gbr_dl,
            mbr_ul: gbr_ul,
        }
    }
}
