//! Scheduler configuration management
//!
//! This crate provides configuration loading and parsing for the MAC scheduler:
//! - TOML configuration file parsing
//! - Scheduler and cell configuration structures

pub mod sched_config;
pub mod toml_config;

pub use sched_config::*;
pub use toml_config::*;
