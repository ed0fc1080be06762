pub mod cell_config;
pub mod harq;
pub mod ue_registry;
