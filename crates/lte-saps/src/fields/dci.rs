use lte_core::Rnti;

/// Downlink control information, format 1/2 style with type 0 resource allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlDci {
    pub rnti: Rnti,
    /// One bit per RBG, bit i set when RBG i is allocated
    pub rb_bitmap: u32,
    /// Resource allocation type, 0 for RBG bitmaps
    pub res_alloc: u8,
    /// TB size in bytes, per layer
    pub tbs_size: Vec<u16>,
    /// Per layer
    pub mcs: Vec<u8>,
    /// New data indicator per layer, 1 for new data, 0 for a retransmission
    pub ndi: Vec<u8>,
    /// Redundancy version per layer
    pub rv: Vec<u8>,
    pub harq_process: u8,
    pub tpc: u8,
}

impl DlDci {
    /// Indices of the allocated RBGs in ascending order
    pub fn rbgs(&self) -> Vec<usize> {
        (0..32).filter(|&i| self.rb_bitmap & (1u32 << i) != 0).collect()
    }

    pub fn rbg_count(&self) -> usize {
        self.rb_bitmap.count_ones() as usize
    }

    pub fn bitmap_from_rbgs(rbgs: &[usize]) -> u32 {
        rbgs.iter().fold(0u32, |acc, &i| acc | (1u32 << i))
    }

    pub fn num_layers(&self) -> usize {
        self.ndi.len()
    }
}

/// Uplink control information, format 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlDci {
    pub rnti: Rnti,
    pub rb_start: u8,
    pub rb_len: u8,
    /// TB size in bytes
    pub tb_size: u16,
    pub mcs: u8,
    /// New data indicator, 1 for new data, 0 for a retransmission
    pub ndi: u8,
    pub tpc: i8,
    pub cqi_request: bool,
    pub hopping: bool,
}

impl UlDci {
    pub fn rb_range(&self) -> std::ops::Range<usize> {
        self.rb_start as usize..self.rb_start as usize + self.rb_len as usize
    }
}
