#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sla_core::{
    config::SlaPolicy,
    deriver::SlaDeriver,
    ticket::{EnrichedTicket, Ticket},
};

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Resolved ticket: first response on 2024-01-`day` at 00:00,
/// resolved `hours` later.
pub fn ticket(id: &str, priority: &str, day: u32, hours: f64) -> Ticket {
    let start = at(day, 0);
    Ticket {
        id: id.into(),
        priority: priority.into(),
        ticket_type: "Technical issue".into(),
        channel: "Email".into(),
        product: "GoPro Hero".into(),
        status: "Closed".into(),
        purchase_date: None,
        first_response_at: Some(start),
        resolved_at: Some(start + Duration::seconds((hours * 3600.0) as i64)),
        satisfaction_rating: None,
        predicted_breach_probability: None,
    }
}

pub fn with_prob(mut t: Ticket, p: f64) -> Ticket {
    t.predicted_breach_probability = Some(p);
    t
}

pub fn enrich(tickets: &[Ticket]) -> Vec<EnrichedTicket> {
    let policy = SlaPolicy::standard();
    SlaDeriver::new(&policy).derive(tickets).unwrap()
}
