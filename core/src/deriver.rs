//! SLA deriver — ticket timestamps + priority → breach flag + cost.
//!
//! RULES:
//!   - Pure: the input batch is borrowed and never mutated.
//!   - All-or-nothing: one unknown priority fails the whole batch,
//!     no partially enriched table is ever returned.
//!   - A ticket resolved in exactly its target time is NOT a breach.

use crate::{
    config::SlaPolicy,
    error::SlaResult,
    ticket::{EnrichedTicket, Ticket},
};

pub struct SlaDeriver<'a> {
    policy: &'a SlaPolicy,
}

impl<'a> SlaDeriver<'a> {
    pub fn new(policy: &'a SlaPolicy) -> Self {
        Self { policy }
    }

    pub fn derive(&self, tickets: &[Ticket]) -> SlaResult<Vec<EnrichedTicket>> {
        let enriched = tickets
            .iter()
            .map(|t| self.derive_one(t))
            .collect::<SlaResult<Vec<_>>>()?;

        let anomalies = enriched.iter().filter(|t| t.response_order_anomaly).count();
        if anomalies > 0 {
            log::warn!(
                "{anomalies} of {} tickets resolve before their first response; \
                 resolution hours use the absolute delta",
                enriched.len()
            );
        }
        let breaches = enriched.iter().filter(|t| t.is_breach).count();
        log::info!("Derived SLA status for {} tickets ({breaches} breaches)", enriched.len());
        Ok(enriched)
    }

    pub fn derive_one(&self, ticket: &Ticket) -> SlaResult<EnrichedTicket> {
        let tier = self.policy.tier(&ticket.id, &ticket.priority)?;
        let resolution_hours = ticket.elapsed_hours();
        let is_breach = resolution_hours.is_some_and(|h| h > tier.target_hours);
        let breach_cost = if is_breach { tier.breach_cost } else { 0.0 };

        Ok(EnrichedTicket {
            ticket: ticket.clone(),
            resolution_hours,
            sla_target_hours: tier.target_hours,
            is_breach,
            breach_cost,
            response_order_anomaly: ticket.has_inverted_timestamps(),
        })
    }
}

/// Tickets whose resolution timestamp precedes the first response.
pub fn timestamp_anomalies(tickets: &[EnrichedTicket]) -> Vec<&EnrichedTicket> {
    tickets.iter().filter(|t| t.response_order_anomaly).collect()
}
