/// Upper (exclusive) DL bandwidth limits for RBG sizes 1, 2, 3 and 4, 36.213 table 7.1.6.1-1
const RBG_SIZE_TABLE: [u8; 4] = [10, 26, 63, 110];

/// Largest bandwidth, in RBs, the scheduler accepts
pub const MAX_BANDWIDTH: u8 = 110;

/// Number of RBs per resource block group for a DL bandwidth
pub fn rbg_size_for_bandwidth(dl_bandwidth: u8) -> usize {
    RBG_SIZE_TABLE
        .iter()
        .position(|&limit| dl_bandwidth < limit)
        .map(|i| i + 1)
        .unwrap_or(RBG_SIZE_TABLE.len())
}

/// Static cell parameters, fixed until the next cell configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellConfig {
    pub dl_bandwidth: u8,
    pub ul_bandwidth: u8,
    pub rbg_size: usize,
    /// MCS of random access response grants
    pub ul_grant_mcs: u8,
}

impl CellConfig {
    /// Returns None for bandwidths of 0 or above MAX_BANDWIDTH
    pub fn new(dl_bandwidth: u8, ul_bandwidth: u8, ul_grant_mcs: u8) -> Option<Self> {
        let valid = |bw: u8| bw > 0 && bw <= MAX_BANDWIDTH;
        if !valid(dl_bandwidth) || !valid(ul_bandwidth) {
            return None;
        }
        Some(CellConfig {
            dl_bandwidth,
            ul_bandwidth,
            rbg_size: rbg_size_for_bandwidth(dl_bandwidth),
            ul_grant_mcs,
        })
    }

    /// Number of whole RBGs in the DL band. A trailing partial group is not used.
    pub fn rbg_num(&self) -> usize {
        self.dl_bandwidth as usize / self.rbg_size
    }

    pub fn ul_rb_num(&self) -> usize {
        self.ul_bandwidth as usize
    }
}
