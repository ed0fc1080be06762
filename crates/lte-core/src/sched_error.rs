use core::fmt;

use crate::{Direction, FlowId, Rnti};

/// Configuration-invariant violations. Any of these aborts the current scheduler call;
/// continuing would corrupt the shared tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedErr {
    /// The cell was never configured
    CellNotConfigured,
    /// Per-UE table entry missing for a configured RNTI
    UeContextMissing { rnti: Rnti },
    HarqProcessNotFound { dir: Direction, rnti: Rnti, process: u8 },
    RlcPduListMissing { rnti: Rnti, process: u8 },
    /// A flow with an allocation has no buffer state
    RlcBufferMissing { flow: FlowId },
}

impl fmt::Display for SchedErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedErr::CellNotConfigured => write!(f, "cell not configured"),
            SchedErr::UeContextMissing { rnti } => write!(f, "no UE context for RNTI {}", rnti),
            SchedErr::HarqProcessNotFound { dir, rnti, process } => {
                write!(f, "{} HARQ process {} not found for RNTI {}", dir, process, rnti)
            }
            SchedErr::RlcPduListMissing { rnti, process } => {
                write!(f, "RLC PDU list missing in HARQ buffer for RNTI {} process {}", rnti, process)
            }
            SchedErr::RlcBufferMissing { flow } => write!(f, "no RLC buffer state for flow {}", flow),
        }
    }
}

impl std::error::Error for SchedErr {}
