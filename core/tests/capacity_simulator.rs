//! Capacity simulator tests — per-day top-k escalation and its economics.

mod common;

use common::{enrich, ticket, with_prob};
use sla_core::{
    error::SlaError,
    simulator::{simulate, Capacity, CapacitySimulator},
    ticket::Ticket,
};
use std::num::NonZeroUsize;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn cap(n: i64) -> Capacity {
    Capacity::per_day(n).unwrap()
}

/// Critical tickets on `day`: `breach` decides 5h (breach) vs 1h.
fn critical(id: &str, day: u32, prob: f64, breach: bool) -> Ticket {
    with_prob(ticket(id, "Critical", day, if breach { 5.0 } else { 1.0 }), prob)
}

// ── Ranking and flagging ─────────────────────────────────────────────────────

#[test]
fn top_two_of_three_are_flagged() {
    let tickets = enrich(&[
        critical("A", 1, 0.9, true),
        critical("B", 1, 0.5, true),
        critical("C", 1, 0.2, true),
    ]);
    let result = simulate(&tickets, cap(2), 2.0).unwrap();

    let flags: Vec<bool> = result.flags.iter().map(|f| f.is_flagged).collect();
    assert_eq!(flags, vec![true, true, false]);
    assert_eq!(result.flags[0].cohort_rank, Some(1));
    assert_eq!(result.flags[2].cohort_rank, Some(3));
}

#[test]
fn ranking_ignores_input_order() {
    let tickets = enrich(&[
        critical("low", 1, 0.2, false),
        critical("high", 1, 0.9, false),
        critical("mid", 1, 0.5, false),
    ]);
    let result = simulate(&tickets, cap(1), 0.0).unwrap();
    assert_eq!(result.flagged_ids(), vec!["high"]);
}

/// Equal probabilities: earlier rows win.
#[test]
fn ties_break_by_input_order() {
    let tickets = enrich(&[
        critical("first", 1, 0.7, false),
        critical("second", 1, 0.7, false),
        critical("third", 1, 0.7, false),
    ]);
    let result = simulate(&tickets, cap(2), 1.0).unwrap();
    assert_eq!(result.flagged_ids(), vec!["first", "second"]);
    assert_eq!(result.flags[1].cohort_rank, Some(2));
}

/// Capacity is per day: a quiet day's spare slots do not move.
#[test]
fn capacity_is_a_per_day_ceiling() {
    let tickets = enrich(&[
        critical("d1-a", 1, 0.9, true),
        critical("d2-a", 2, 0.8, true),
        critical("d2-b", 2, 0.7, true),
        critical("d2-c", 2, 0.6, true),
        critical("d2-d", 2, 0.5, true),
    ]);
    let result = simulate(&tickets, cap(2), 1.0).unwrap();

    assert_eq!(result.flagged_ids(), vec!["d1-a", "d2-a", "d2-b"]);
    assert_eq!(result.cohorts.len(), 2);
    assert_eq!(result.cohorts[0].size, 1);
    assert_eq!(result.cohorts[0].flagged, 1);
    assert_eq!(result.cohorts[1].flagged, 2);
    assert_eq!(result.review_budget(), Some(4));
}

#[test]
fn unbounded_capacity_flags_everything_with_a_cohort() {
    let mut no_response = critical("silent", 1, 0.99, false);
    no_response.first_response_at = None;
    no_response.resolved_at = None;

    let tickets = enrich(&[
        critical("A", 1, 0.1, false),
        critical("B", 3, 0.2, true),
        no_response,
    ]);
    let result = simulate(&tickets, Capacity::Unbounded, 1.0).unwrap();

    assert!(result.is_flagged(0));
    assert!(result.is_flagged(1));
    assert!(!result.is_flagged(2), "no first response, no cohort");
    assert_eq!(result.flags[2].cohort_rank, None);
    assert_eq!(result.review_budget(), None);
}

// ── Metrics ──────────────────────────────────────────────────────────────────

#[test]
fn metrics_follow_the_formulas() {
    // Day 1: A (breach, 50) and B (no breach) flagged; C (breach) missed.
    let tickets = enrich(&[
        critical("A", 1, 0.9, true),
        critical("B", 1, 0.8, false),
        critical("C", 1, 0.1, true),
        with_prob(ticket("D", "Medium", 2, 30.0), 0.6),
    ]);
    let result = simulate(&tickets, cap(2), 5.0).unwrap();
    let m = &result.metrics;

    assert_eq!(m.tickets_reviewed, 3);
    assert_eq!(m.breaches_prevented, 2);
    assert_eq!(m.operational_cost, 15.0);
    assert_eq!(m.gross_savings, 60.0);
    assert_eq!(m.net_savings, 45.0);
    assert!((m.roi - 3.0).abs() < 1e-12);
    assert_eq!(m.baseline_loss, 110.0);
}

#[test]
fn zero_intervention_cost_gives_zero_roi() {
    let tickets = enrich(&[critical("A", 1, 0.9, true), critical("B", 1, 0.3, true)]);
    let result = simulate(&tickets, cap(1), 0.0).unwrap();

    assert_eq!(result.metrics.operational_cost, 0.0);
    assert_eq!(result.metrics.roi, 0.0);
    assert_eq!(result.metrics.net_savings, 50.0);
}

#[test]
fn empty_table_yields_zero_metrics() {
    let result = simulate(&[], cap(10), 2.0).unwrap();
    assert_eq!(result.metrics.tickets_reviewed, 0);
    assert_eq!(result.metrics.roi, 0.0);
    assert!(result.risk_capture.is_empty());
    assert!(result.cohorts.is_empty());
}

#[test]
fn increasing_capacity_never_reduces_reviews_or_prevention() {
    let tickets: Vec<Ticket> = (0..30)
        .map(|i| {
            let prob = ((i * 37) % 100) as f64 / 100.0;
            critical(&format!("T{i}"), 1 + (i % 3) as u32, prob, i % 2 == 0)
        })
        .collect();
    let tickets = enrich(&tickets);

    let mut last = (0, 0);
    for n in 1..=12 {
        let m = simulate(&tickets, cap(n), 1.0).unwrap().metrics;
        assert!(m.tickets_reviewed >= last.0, "capacity {n}");
        assert!(m.breaches_prevented >= last.1, "capacity {n}");
        last = (m.tickets_reviewed, m.breaches_prevented);
    }
    let all = simulate(&tickets, Capacity::Unbounded, 1.0).unwrap().metrics;
    assert_eq!(all.tickets_reviewed, 30);
    assert!(all.breaches_prevented >= last.1);
}

// ── Risk-capture curve ───────────────────────────────────────────────────────

#[test]
fn risk_capture_curve_is_cumulative_and_ends_at_one() {
    let tickets = enrich(&[
        critical("A", 1, 0.2, true),                         // 50
        critical("B", 2, 0.9, true),                         // 50
        with_prob(ticket("C", "Medium", 3, 30.0), 0.5),      // 10
        critical("D", 3, 0.7, false),                        // 0
    ]);
    let result = simulate(&tickets, cap(1), 1.0).unwrap();
    let curve: Vec<(usize, f64)> = result
        .risk_capture
        .iter()
        .map(|p| (p.tickets_reviewed, p.fraction_captured))
        .collect();

    // Global order: B (0.9), D (0.7), C (0.5), A (0.2).
    let expected = [(1, 50.0 / 110.0), (2, 50.0 / 110.0), (3, 60.0 / 110.0), (4, 1.0)];
    assert_eq!(curve.len(), expected.len());
    for ((n, f), (en, ef)) in curve.iter().zip(expected) {
        assert_eq!(*n, en);
        assert!((f - ef).abs() < 1e-12, "at {n}: {f} vs {ef}");
    }
    assert!((result.fraction_captured_at(2) - 50.0 / 110.0).abs() < 1e-12);
    assert_eq!(result.fraction_captured_at(100), 1.0);
}

#[test]
fn risk_capture_without_any_cost_stays_at_zero() {
    let tickets = enrich(&[critical("A", 1, 0.5, false), critical("B", 1, 0.4, false)]);
    let result = simulate(&tickets, cap(1), 1.0).unwrap();
    assert!(result.risk_capture.iter().all(|p| p.fraction_captured == 0.0));
}

// ── Kill list ────────────────────────────────────────────────────────────────

#[test]
fn kill_list_shows_latest_day_riskiest_first() {
    let tickets = enrich(&[
        critical("old", 1, 0.99, true),
        critical("new-low", 5, 0.3, true),
        critical("new-high", 5, 0.8, true),
        critical("new-unflagged", 5, 0.1, true),
    ]);
    let result = simulate(&tickets, cap(2), 1.0).unwrap();
    let list: Vec<(&str, f64)> = result
        .kill_list(&tickets)
        .iter()
        .map(|(t, p)| (t.id(), *p))
        .collect();
    assert_eq!(list, vec![("new-high", 0.8), ("new-low", 0.3)]);
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[test]
fn missing_probability_column_is_rejected() {
    let tickets = enrich(&[ticket("A", "Low", 1, 1.0)]);
    let err = simulate(&tickets, cap(5), 1.0).unwrap_err();
    assert!(matches!(err, SlaError::MissingColumn { .. }), "got {err:?}");
}

#[test]
fn out_of_range_probability_is_rejected() {
    let tickets = enrich(&[critical("A", 1, 1.5, true)]);
    let err = simulate(&tickets, cap(5), 1.0).unwrap_err();
    assert!(matches!(err, SlaError::InvalidProbability { value, .. } if value == 1.5));

    let tickets = enrich(&[critical("N", 1, f64::NAN, true)]);
    assert!(simulate(&tickets, cap(5), 1.0).is_err());
}

#[test]
fn non_positive_capacity_is_rejected() {
    assert!(matches!(Capacity::per_day(0), Err(SlaError::InvalidCapacity { .. })));
    assert!(matches!(Capacity::per_day(-3), Err(SlaError::InvalidCapacity { .. })));
    assert!(matches!("ten".parse::<Capacity>(), Err(SlaError::InvalidCapacity { .. })));
    assert!(matches!("2.5".parse::<Capacity>(), Err(SlaError::InvalidCapacity { .. })));
    assert_eq!("All".parse::<Capacity>().unwrap(), Capacity::Unbounded);
    assert_eq!(" 75 ".parse::<Capacity>().unwrap(), cap(75));
}

/// A zero ceiling has no representation, so neither construction nor a
/// config document can hand one to the simulator.
#[test]
fn zero_capacity_never_reaches_the_simulator() {
    assert_eq!(NonZeroUsize::new(0).map(Capacity::PerDay), None);
    assert!(matches!("0".parse::<Capacity>(), Err(SlaError::InvalidCapacity { .. })));

    assert!(serde_json::from_str::<Capacity>(r#"{"per_day":0}"#).is_err());
    assert!(serde_json::from_str::<Capacity>(r#"{"per_day":-1}"#).is_err());
    assert_eq!(serde_json::from_str::<Capacity>(r#"{"per_day":3}"#).unwrap(), cap(3));
    assert_eq!(serde_json::from_str::<Capacity>(r#""unbounded""#).unwrap(), Capacity::Unbounded);

    let tickets = enrich(&[critical("A", 1, 0.9, true)]);
    let three = serde_json::from_str::<Capacity>(r#"{"per_day":3}"#).unwrap();
    assert_eq!(simulate(&tickets, three, 1.0).unwrap().flagged_ids(), vec!["A"]);
}

#[test]
fn negative_intervention_cost_is_rejected() {
    assert!(matches!(
        CapacitySimulator::new(cap(1), -1.0),
        Err(SlaError::InvalidInterventionCost { .. })
    ));
}
