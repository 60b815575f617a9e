//! SLA breach derivation and capacity-constrained ticket triage.

pub mod analytics;
pub mod bottleneck;
pub mod config;
pub mod deriver;
pub mod error;
pub mod monitoring;
pub mod pipeline;
pub mod scenario;
pub mod simulator;
pub mod store;
pub mod ticket;
pub mod types;
pub mod watchdog;
