pub mod build_data;
pub mod cqi;
pub mod dci;
pub mod harq_info;
pub mod lc_config;
pub mod mac_ce;
