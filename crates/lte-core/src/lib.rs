//! Core utilities for the LTE MAC scheduler
//!
//! This crate provides fundamental types and utilities used across the scheduler stack:
//! - SfnSf for frame/subframe timing
//! - Identifier types (RNTI, LCID, FlowId)
//! - AMC tables (CQI, MCS, TBS)
//! - ResourceMap for RB / RBG occupancy
//! - Common macros and debug utilities

pub mod amc;
pub mod conversions;
pub mod debug;
pub mod direction;
pub mod lte_common;
pub mod lte_entities;
pub mod resource_map;
pub mod sched_error;
pub mod sfn_sf;
mod tbs_table;

// Re-export commonly used items
pub use direction::Direction;
pub use lte_common::*;
pub use resource_map::{ResourceMap, ResourceMapErr};
pub use sched_error::SchedErr;
pub use sfn_sf::SfnSf;
