/// Field types shared by several primitives (DCI, CQI, MAC CE, HARQ feedback)
pub mod fields;

/// CSCHED-SAP: cell, UE and logical channel configuration
pub mod csched;
/// SCHED-SAP: per-TTI reports, triggers and indications
pub mod sched;
pub mod sapmsg;

pub use sapmsg::*;
