//! SLA watchdog — daily scan of active, high-exposure tickets.
//!
//! A ticket raises an alert when its status is active AND it is either
//! high priority or of an escalation ticket type. Scheduling the scan
//! (cron, etc.) is the caller's job.

use crate::{
    config::{SlaPolicy, WatchdogConfig},
    error::SlaResult,
    ticket::Ticket,
    types::{Money, TicketId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogAlert {
    pub ticket_id: TicketId,
    pub priority: String,
    pub ticket_type: String,
    pub status: String,
    pub projected_penalty: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogReport {
    pub scanned: usize,
    pub alerts: Vec<WatchdogAlert>,
    pub total_exposure: Money,
}

pub struct Watchdog<'a> {
    policy: &'a SlaPolicy,
    config: &'a WatchdogConfig,
}

impl<'a> Watchdog<'a> {
    pub fn new(policy: &'a SlaPolicy, config: &'a WatchdogConfig) -> Self {
        Self { policy, config }
    }

    fn is_high_risk(&self, ticket: &Ticket) -> bool {
        let active = self.config.active_statuses.contains(&ticket.status);
        let escalated_priority = self.config.escalation_priorities.contains(&ticket.priority);
        let escalated_type = self.config.escalation_ticket_types.contains(&ticket.ticket_type);
        active && (escalated_priority || escalated_type)
    }

    pub fn scan(&self, tickets: &[Ticket]) -> SlaResult<WatchdogReport> {
        let mut alerts = Vec::new();
        for ticket in tickets.iter().filter(|t| self.is_high_risk(t)) {
            let tier = self.policy.tier(&ticket.id, &ticket.priority)?;
            alerts.push(WatchdogAlert {
                ticket_id: ticket.id.clone(),
                priority: ticket.priority.clone(),
                ticket_type: ticket.ticket_type.clone(),
                status: ticket.status.clone(),
                projected_penalty: tier.breach_cost,
            });
        }
        let total_exposure = alerts.iter().map(|a| a.projected_penalty).sum();

        log::info!(
            "Watchdog scan: {} risk tickets of {}, exposure {total_exposure:.2}",
            alerts.len(),
            tickets.len()
        );
        Ok(WatchdogReport {
            scanned: tickets.len(),
            alerts,
            total_exposure,
        })
    }
}
