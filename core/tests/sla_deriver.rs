//! SLA deriver tests — breach flag and cost per priority.

mod common;

use chrono::NaiveDateTime;
use common::{at, ticket};
use sla_core::{
    config::{PriorityTier, SlaPolicy},
    deriver::{timestamp_anomalies, SlaDeriver},
    error::SlaError,
};

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

// ── Concrete scenarios ───────────────────────────────────────────────────────

/// Critical, 00:00 → 05:00 the same day: 5h > 4h target, costs 50.
#[test]
fn critical_five_hours_breaches() {
    let mut t = ticket("T-1", "Critical", 1, 0.0);
    t.first_response_at = Some(ts("2024-01-01T00:00:00"));
    t.resolved_at = Some(ts("2024-01-01T05:00:00"));

    let policy = SlaPolicy::standard();
    let e = SlaDeriver::new(&policy).derive_one(&t).unwrap();

    assert_eq!(e.resolution_hours, Some(5.0));
    assert_eq!(e.sla_target_hours, 4.0);
    assert!(e.is_breach);
    assert_eq!(e.breach_cost, 50.0);
}

/// Resolving in exactly the target time is not a breach.
#[test]
fn low_exactly_on_target_is_not_a_breach() {
    let policy = SlaPolicy::standard();
    let e = SlaDeriver::new(&policy)
        .derive_one(&ticket("T-2", "Low", 1, 48.0))
        .unwrap();

    assert_eq!(e.resolution_hours, Some(48.0));
    assert!(!e.is_breach);
    assert_eq!(e.breach_cost, 0.0);
}

#[test]
fn cost_table_applies_per_priority() {
    let policy = SlaPolicy::standard();
    let deriver = SlaDeriver::new(&policy);
    let cases = [
        ("Critical", 4.5, 50.0),
        ("High", 12.5, 50.0),
        ("Medium", 24.5, 10.0),
        ("Low", 48.5, 10.0),
    ];
    for (priority, hours, cost) in cases {
        let e = deriver.derive_one(&ticket("T", priority, 1, hours)).unwrap();
        assert!(e.is_breach, "{priority} at {hours}h should breach");
        assert_eq!(e.breach_cost, cost, "{priority} breach cost");
    }
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn breach_flag_and_cost_are_consistent() {
    let policy = SlaPolicy::standard();
    let tickets: Vec<_> = (0..40)
        .map(|i| {
            let priority = ["Critical", "High", "Medium", "Low"][i % 4];
            ticket(&format!("T-{i}"), priority, 1, i as f64 * 1.5)
        })
        .collect();

    let enriched = SlaDeriver::new(&policy).derive(&tickets).unwrap();
    for e in &enriched {
        let hours = e.resolution_hours.unwrap();
        assert_eq!(e.is_breach, hours > e.sla_target_hours, "ticket {}", e.id());
        let tier = policy.tier(e.id(), &e.ticket.priority).unwrap();
        if e.is_breach {
            assert_eq!(e.breach_cost, tier.breach_cost);
        } else {
            assert_eq!(e.breach_cost, 0.0);
        }
    }
}

#[test]
fn derivation_is_idempotent_and_leaves_input_untouched() {
    let policy = SlaPolicy::standard();
    let tickets = vec![
        ticket("A", "High", 1, 13.0),
        ticket("B", "Medium", 2, 3.0),
        ticket("C", "Critical", 3, 4.0),
    ];
    let before = tickets.clone();

    let deriver = SlaDeriver::new(&policy);
    let first = deriver.derive(&tickets).unwrap();
    let second = deriver.derive(&tickets).unwrap();

    assert_eq!(first, second);
    assert_eq!(tickets, before);
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// One bad priority fails the whole batch; nothing partial comes back.
#[test]
fn unknown_priority_aborts_batch() {
    let policy = SlaPolicy::standard();
    let tickets = vec![
        ticket("A", "High", 1, 1.0),
        ticket("B", "Urgent", 1, 1.0),
        ticket("C", "Low", 1, 1.0),
    ];

    let err = SlaDeriver::new(&policy).derive(&tickets).unwrap_err();
    match err {
        SlaError::Configuration { ticket_id, priority } => {
            assert_eq!(ticket_id, "B");
            assert_eq!(priority, "Urgent");
        }
        other => panic!("expected Configuration error, got {other:?}"),
    }
}

#[test]
fn custom_policy_is_honoured() {
    let policy = SlaPolicy::from_tiers(vec![PriorityTier {
        priority: "Gold".into(),
        target_hours: 1.0,
        breach_cost: 500.0,
    }])
    .unwrap();
    let e = SlaDeriver::new(&policy)
        .derive_one(&ticket("G", "Gold", 1, 2.0))
        .unwrap();
    assert!(e.is_breach);
    assert_eq!(e.breach_cost, 500.0);

    // The standard labels are unknown to this tenant.
    assert!(SlaDeriver::new(&policy).derive_one(&ticket("L", "Low", 1, 2.0)).is_err());
}

// ── Timestamps ───────────────────────────────────────────────────────────────

/// Resolution before first response: absolute delta, but flagged.
#[test]
fn inverted_timestamps_use_absolute_delta_and_are_reported() {
    let mut t = ticket("INV", "Critical", 1, 0.0);
    t.first_response_at = Some(at(1, 10));
    t.resolved_at = Some(at(1, 4));

    let enriched = common::enrich(&[t, ticket("OK", "Critical", 1, 1.0)]);
    assert_eq!(enriched[0].resolution_hours, Some(6.0));
    assert!(enriched[0].is_breach);
    assert!(enriched[0].response_order_anomaly);
    assert!(!enriched[1].response_order_anomaly);

    let anomalies = timestamp_anomalies(&enriched);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].id(), "INV");
}

/// Open tickets have no resolution yet: no hours, no breach, no cost.
#[test]
fn unresolved_ticket_is_not_a_breach() {
    let mut t = ticket("OPEN", "Critical", 1, 100.0);
    t.resolved_at = None;
    t.status = "Open".into();

    let enriched = common::enrich(&[t]);
    assert_eq!(enriched[0].resolution_hours, None);
    assert!(!enriched[0].is_breach);
    assert_eq!(enriched[0].breach_cost, 0.0);
    assert_eq!(enriched[0].sla_target_hours, 4.0);
}
