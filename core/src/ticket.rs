//! Ticket records — the raw helpdesk row and its SLA-enriched form.

use crate::types::{Hours, Money, TicketId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One support ticket as exported by the helpdesk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub priority: String,
    pub ticket_type: String,
    pub channel: String,
    pub product: String,
    pub status: String,
    /// Date the customer bought the product the ticket is about.
    pub purchase_date: Option<NaiveDate>,
    /// Empty for tickets nobody has answered yet.
    pub first_response_at: Option<NaiveDateTime>,
    /// Empty for tickets still open.
    pub resolved_at: Option<NaiveDateTime>,
    pub satisfaction_rating: Option<f64>,
    /// Supplied by the external breach model; never computed here.
    pub predicted_breach_probability: Option<f64>,
}

impl Ticket {
    /// Arrival day: the calendar date of first response.
    /// This is the unit over which daily capacity is enforced.
    pub fn arrival_day(&self) -> Option<NaiveDate> {
        self.first_response_at.map(|t| t.date())
    }

    /// Day a ticket counts toward demand: purchase date when known,
    /// otherwise arrival day.
    pub fn demand_day(&self) -> Option<NaiveDate> {
        self.purchase_date.or_else(|| self.arrival_day())
    }

    /// Hours between first response and resolution, taken as an
    /// absolute value. `None` when either timestamp is missing.
    pub fn elapsed_hours(&self) -> Option<Hours> {
        let start = self.first_response_at?;
        let end = self.resolved_at?;
        let seconds = (end - start).num_seconds().abs();
        Some(seconds as f64 / 3600.0)
    }

    /// True when the resolution timestamp precedes the first response.
    pub fn has_inverted_timestamps(&self) -> bool {
        match (self.first_response_at, self.resolved_at) {
            (Some(start), Some(end)) => end < start,
            _ => false,
        }
    }
}

/// A ticket plus the fields the SLA deriver adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTicket {
    pub ticket: Ticket,
    pub resolution_hours: Option<Hours>,
    pub sla_target_hours: Hours,
    pub is_breach: bool,
    pub breach_cost: Money,
    pub response_order_anomaly: bool,
}

impl EnrichedTicket {
    pub fn id(&self) -> &str {
        &self.ticket.id
    }

    pub fn probability(&self) -> Option<f64> {
        self.ticket.predicted_breach_probability
    }

    pub fn arrival_day(&self) -> Option<NaiveDate> {
        self.ticket.arrival_day()
    }
}
