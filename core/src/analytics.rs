//! Breakdown analytics over the enriched ticket table.
//!
//! Everything here is a read-only aggregation: where is the money lost,
//! and which groups breach most often.

use crate::{
    ticket::EnrichedTicket,
    types::{Hours, Money},
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

/// Categorical column to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Priority,
    TicketType,
    Channel,
    Product,
}

impl Dimension {
    pub fn key<'t>(&self, ticket: &'t EnrichedTicket) -> &'t str {
        let t = &ticket.ticket;
        match self {
            Dimension::Priority => &t.priority,
            Dimension::TicketType => &t.ticket_type,
            Dimension::Channel => &t.channel,
            Dimension::Product => &t.product,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_tickets: usize,
    pub avg_resolution_hours: Option<Hours>,
    pub breach_rate: f64,
    pub total_breach_cost: Money,
    pub avg_satisfaction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdown {
    pub group: String,
    pub tickets: usize,
    pub breaches: usize,
    pub breach_rate: f64,
    pub breach_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCost {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    pub breach_cost: Money,
}

// ── Aggregations ─────────────────────────────────────────────────────────────

pub fn executive_summary(tickets: &[EnrichedTicket]) -> ExecutiveSummary {
    let breaches = tickets.iter().filter(|t| t.is_breach).count();
    ExecutiveSummary {
        total_tickets: tickets.len(),
        avg_resolution_hours: mean(tickets.iter().filter_map(|t| t.resolution_hours)),
        breach_rate: ratio(breaches, tickets.len()),
        total_breach_cost: tickets.iter().map(|t| t.breach_cost).sum(),
        avg_satisfaction: mean(tickets.iter().filter_map(|t| t.ticket.satisfaction_rating)),
    }
}

/// Tickets, breaches, breach rate and cost per group, sorted by group key.
pub fn breakdown_by(tickets: &[EnrichedTicket], dimension: Dimension) -> Vec<GroupBreakdown> {
    let mut groups: BTreeMap<&str, (usize, usize, Money)> = BTreeMap::new();
    for t in tickets {
        let entry = groups.entry(dimension.key(t)).or_insert((0, 0, 0.0));
        entry.0 += 1;
        if t.is_breach {
            entry.1 += 1;
        }
        entry.2 += t.breach_cost;
    }
    groups
        .into_iter()
        .map(|(group, (n, breaches, cost))| GroupBreakdown {
            group: group.to_string(),
            tickets: n,
            breaches,
            breach_rate: ratio(breaches, n),
            breach_cost: cost,
        })
        .collect()
}

/// Breach cost per ISO week of arrival. Weeks with no tickets inside the
/// observed range appear with zero cost.
pub fn weekly_cost_trend(tickets: &[EnrichedTicket]) -> Vec<WeeklyCost> {
    let mut weeks: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for t in tickets {
        if let Some(day) = t.arrival_day() {
            *weeks.entry(week_start(day)).or_insert(0.0) += t.breach_cost;
        }
    }
    let (Some(&first), Some(&last)) = (weeks.keys().next(), weeks.keys().next_back()) else {
        return Vec::new();
    };

    let mut trend = Vec::new();
    let mut week = first;
    while week <= last {
        trend.push(WeeklyCost {
            week_start: week,
            breach_cost: weeks.get(&week).copied().unwrap_or(0.0),
        });
        week += Duration::days(7);
    }
    trend
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
