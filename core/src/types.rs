//! Shared primitive types used across every stage.

/// Stable ticket identifier, as exported by the helpdesk.
pub type TicketId = String;

/// Monetary amount in the reporting currency.
pub type Money = f64;

/// Elapsed time in hours.
pub type Hours = f64;

/// Identifier for a persisted export run.
pub type RunId = String;

/// Name of the probability column the simulator requires.
pub const PROBABILITY_COLUMN: &str = "predicted_breach_probability";
