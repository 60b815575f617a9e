//! What-if scenarios: speed up a slice of tickets and re-measure breaches.
//!
//! SLA targets never change in a scenario, only resolution hours.

use crate::{analytics::ratio, config::ScenarioConfig, ticket::EnrichedTicket};
use serde::{Deserialize, Serialize};

pub const BASELINE: &str = "Baseline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub breach_rate: f64,
    pub breaches: usize,
    /// Tickets whose resolution time the scenario changed.
    pub affected: usize,
}

fn matches(scenario: &ScenarioConfig, ticket: &EnrichedTicket) -> bool {
    let t = &ticket.ticket;
    let priority_ok = scenario.priorities.is_empty() || scenario.priorities.contains(&t.priority);
    let type_ok = scenario.ticket_types.is_empty() || scenario.ticket_types.contains(&t.ticket_type);
    let breach_ok = !scenario.breached_only || ticket.is_breach;
    priority_ok && type_ok && breach_ok
}

pub fn apply(scenario: &ScenarioConfig, tickets: &[EnrichedTicket]) -> ScenarioOutcome {
    let mut affected = 0;
    let mut breaches = 0;
    for t in tickets {
        let Some(hours) = t.resolution_hours else { continue };
        let hours = if matches(scenario, t) {
            affected += 1;
            hours * scenario.resolution_factor
        } else {
            hours
        };
        if hours > t.sla_target_hours {
            breaches += 1;
        }
    }
    ScenarioOutcome {
        scenario: scenario.name.clone(),
        breach_rate: ratio(breaches, tickets.len()),
        breaches,
        affected,
    }
}

/// Baseline first, then each scenario in configured order.
pub fn evaluate(scenarios: &[ScenarioConfig], tickets: &[EnrichedTicket]) -> Vec<ScenarioOutcome> {
    let breaches = tickets.iter().filter(|t| t.is_breach).count();
    let mut outcomes = vec![ScenarioOutcome {
        scenario: BASELINE.to_string(),
        breach_rate: ratio(breaches, tickets.len()),
        breaches,
        affected: 0,
    }];
    outcomes.extend(scenarios.iter().map(|s| apply(s, tickets)));
    outcomes
}
