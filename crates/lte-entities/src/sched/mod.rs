//! FF MAC scheduler: per-cell context, allocation engines and selection policies

pub mod dl_engine;
pub mod mac_sched;
pub mod policy;
pub mod scheduler;
pub mod subcomp;
pub mod ul_engine;

pub use mac_sched::MacScheduler;
pub use scheduler::FfMacScheduler;
