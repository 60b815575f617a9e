//! Capacity simulator — "the Sniper".
//!
//! Given a breach probability per ticket and a daily escalation capacity,
//! decides which tickets get proactively escalated and prices the outcome.
//!
//! RULES:
//!   - Cohort = arrival day (calendar date of first response). Tickets
//!     without a first response join no cohort and are never flagged.
//!   - Ranking inside a cohort: probability descending, then original
//!     input position ascending. The same order drives the risk curve.
//!   - Capacity is a per-day ceiling. Unused slots on a quiet day are
//!     never carried over to a busy one.
//!   - A flagged ticket that actually breached counts as fully prevented.

use crate::{
    error::{SlaError, SlaResult},
    ticket::EnrichedTicket,
    types::{Money, TicketId, PROBABILITY_COLUMN},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap, fmt, num::NonZeroUsize, str::FromStr};

// ── Capacity ────────────────────────────────────────────────────────────────

/// Maximum tickets escalated per cohort. A zero ceiling is not representable,
/// and `{"per_day": 0}` fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    PerDay(NonZeroUsize),
    Unbounded,
}

impl Capacity {
    pub fn per_day(n: i64) -> SlaResult<Self> {
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Capacity::PerDay)
            .ok_or_else(|| SlaError::InvalidCapacity { value: n.to_string() })
    }

    /// How many tickets of a cohort of `cohort_size` may be flagged.
    pub fn limit(&self, cohort_size: usize) -> usize {
        match self {
            Capacity::PerDay(n) => n.get().min(cohort_size),
            Capacity::Unbounded => cohort_size,
        }
    }
}

impl FromStr for Capacity {
    type Err = SlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Capacity::Unbounded);
        }
        let n: i64 = trimmed
            .parse()
            .map_err(|_| SlaError::InvalidCapacity { value: s.to_string() })?;
        Capacity::per_day(n)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::PerDay(n) => write!(f, "{n}/day"),
            Capacity::Unbounded => write!(f, "All"),
        }
    }
}

// ── Result types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketFlag {
    pub ticket_id: TicketId,
    pub arrival_day: Option<NaiveDate>,
    /// The validated breach probability the ranking used.
    pub probability: f64,
    /// 1-based position inside the cohort ranking.
    pub cohort_rank: Option<usize>,
    pub is_flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub tickets_reviewed: usize,
    pub breaches_prevented: usize,
    pub operational_cost: Money,
    pub gross_savings: Money,
    pub net_savings: Money,
    pub roi: f64,
    /// Total breach cost with no intervention at all.
    pub baseline_loss: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub day: NaiveDate,
    pub size: usize,
    pub flagged: usize,
    pub breaches_caught: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCapturePoint {
    pub tickets_reviewed: usize,
    pub fraction_captured: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub capacity: Capacity,
    pub intervention_cost: Money,
    /// One entry per input ticket, in input order.
    pub flags: Vec<TicketFlag>,
    pub metrics: SimulationMetrics,
    pub cohorts: Vec<CohortSummary>,
    pub risk_capture: Vec<RiskCapturePoint>,
}

impl SimulationResult {
    pub fn is_flagged(&self, index: usize) -> bool {
        self.flags.get(index).is_some_and(|f| f.is_flagged)
    }

    pub fn flagged_ids(&self) -> Vec<&str> {
        self.flags
            .iter()
            .filter(|f| f.is_flagged)
            .map(|f| f.ticket_id.as_str())
            .collect()
    }

    /// Total reviews the capacity allows across all cohorts.
    /// `None` when capacity is unbounded.
    pub fn review_budget(&self) -> Option<usize> {
        match self.capacity {
            Capacity::PerDay(n) => Some(n.get() * self.cohorts.len()),
            Capacity::Unbounded => None,
        }
    }

    /// Fraction of total breach cost captured by reviewing the top `n`.
    pub fn fraction_captured_at(&self, n: usize) -> f64 {
        if n == 0 || self.risk_capture.is_empty() {
            return 0.0;
        }
        let idx = n.min(self.risk_capture.len()) - 1;
        self.risk_capture[idx].fraction_captured
    }

    /// Flagged tickets of the most recent cohort with their probabilities,
    /// riskiest first. `tickets` must be the slice the simulation ran on.
    pub fn kill_list<'t>(&self, tickets: &'t [EnrichedTicket]) -> Vec<(&'t EnrichedTicket, f64)> {
        let Some(latest) = self.cohorts.last().map(|c| c.day) else {
            return Vec::new();
        };
        let mut list: Vec<(usize, f64)> = self
            .flags
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_flagged && f.arrival_day == Some(latest))
            .map(|(i, f)| (i, f.probability))
            .collect();
        list.sort_by(rank_order);
        list.into_iter()
            .filter_map(|(i, p)| tickets.get(i).map(|t| (t, p)))
            .collect()
    }
}

// ── Simulator ───────────────────────────────────────────────────────────────

pub struct CapacitySimulator {
    capacity: Capacity,
    intervention_cost: Money,
}

impl CapacitySimulator {
    pub fn new(capacity: Capacity, intervention_cost: Money) -> SlaResult<Self> {
        if !(intervention_cost >= 0.0) {
            return Err(SlaError::InvalidInterventionCost { value: intervention_cost });
        }
        Ok(Self { capacity, intervention_cost })
    }

    pub fn simulate(&self, tickets: &[EnrichedTicket]) -> SlaResult<SimulationResult> {
        let probabilities = probabilities(tickets)?;

        // Partition by arrival day.
        let mut cohorts: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        let mut unassigned = 0usize;
        for (i, ticket) in tickets.iter().enumerate() {
            match ticket.arrival_day() {
                Some(day) => cohorts.entry(day).or_default().push(i),
                None => unassigned += 1,
            }
        }
        if unassigned > 0 {
            log::debug!("{unassigned} tickets have no first response and join no cohort");
        }

        let mut flags: Vec<TicketFlag> = tickets
            .iter()
            .zip(&probabilities)
            .map(|(t, &probability)| TicketFlag {
                ticket_id: t.id().to_string(),
                arrival_day: t.arrival_day(),
                probability,
                cohort_rank: None,
                is_flagged: false,
            })
            .collect();

        let mut summaries = Vec::with_capacity(cohorts.len());
        for (day, mut members) in cohorts {
            members.sort_by(|&a, &b| rank_order(&(a, probabilities[a]), &(b, probabilities[b])));
            let limit = self.capacity.limit(members.len());
            let mut breaches_caught = 0;
            for (pos, &i) in members.iter().enumerate() {
                flags[i].cohort_rank = Some(pos + 1);
                if pos < limit {
                    flags[i].is_flagged = true;
                    if tickets[i].is_breach {
                        breaches_caught += 1;
                    }
                }
            }
            summaries.push(CohortSummary {
                day,
                size: members.len(),
                flagged: limit,
                breaches_caught,
            });
        }

        let metrics = self.price(tickets, &flags);
        log::info!(
            "Simulated capacity {} over {} cohorts: {} reviewed, {} breaches prevented, net {:.2}",
            self.capacity,
            summaries.len(),
            metrics.tickets_reviewed,
            metrics.breaches_prevented,
            metrics.net_savings
        );

        Ok(SimulationResult {
            capacity: self.capacity,
            intervention_cost: self.intervention_cost,
            flags,
            metrics,
            cohorts: summaries,
            risk_capture: risk_capture_curve(tickets, &probabilities),
        })
    }

    fn price(&self, tickets: &[EnrichedTicket], flags: &[TicketFlag]) -> SimulationMetrics {
        let mut tickets_reviewed = 0usize;
        let mut breaches_prevented = 0usize;
        let mut gross_savings = 0.0;
        for (ticket, flag) in tickets.iter().zip(flags) {
            if !flag.is_flagged {
                continue;
            }
            tickets_reviewed += 1;
            if ticket.is_breach {
                breaches_prevented += 1;
                gross_savings += ticket.breach_cost;
            }
        }
        let operational_cost = tickets_reviewed as f64 * self.intervention_cost;
        let net_savings = gross_savings - operational_cost;
        let roi = if operational_cost > 0.0 {
            net_savings / operational_cost
        } else {
            0.0
        };
        SimulationMetrics {
            tickets_reviewed,
            breaches_prevented,
            operational_cost,
            gross_savings,
            net_savings,
            roi,
            baseline_loss: tickets.iter().map(|t| t.breach_cost).sum(),
        }
    }
}

/// One-shot form of `CapacitySimulator::new(..).simulate(..)`.
pub fn simulate(
    tickets: &[EnrichedTicket],
    capacity: Capacity,
    intervention_cost: Money,
) -> SlaResult<SimulationResult> {
    CapacitySimulator::new(capacity, intervention_cost)?.simulate(tickets)
}

/// Cumulative share of total breach cost captured when reviewing tickets
/// in global probability order. All fractions are 0 if nothing breached.
pub fn risk_capture_curve(tickets: &[EnrichedTicket], probabilities: &[f64]) -> Vec<RiskCapturePoint> {
    let mut order: Vec<(usize, f64)> = probabilities.iter().copied().enumerate().collect();
    order.sort_by(rank_order);

    let total: Money = tickets.iter().map(|t| t.breach_cost).sum();
    let mut cumulative = 0.0;
    order
        .into_iter()
        .enumerate()
        .map(|(pos, (i, _))| {
            cumulative += tickets[i].breach_cost;
            RiskCapturePoint {
                tickets_reviewed: pos + 1,
                fraction_captured: if total > 0.0 { cumulative / total } else { 0.0 },
            }
        })
        .collect()
}

/// Extract and validate the probability column.
fn probabilities(tickets: &[EnrichedTicket]) -> SlaResult<Vec<f64>> {
    tickets
        .iter()
        .map(|t| {
            let p = t.probability().ok_or_else(|| SlaError::MissingColumn {
                column: PROBABILITY_COLUMN.to_string(),
            })?;
            if !(0.0..=1.0).contains(&p) {
                return Err(SlaError::InvalidProbability {
                    ticket_id: t.id().to_string(),
                    value: p,
                });
            }
            Ok(p)
        })
        .collect()
}

/// Probability descending, then input position ascending.
fn rank_order(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
