//! CSV ticket loader.
//!
//! Parses a helpdesk export into `Ticket`s. Expected CSV columns:
//!   Ticket ID, Ticket Priority, Ticket Type, Ticket Channel,
//!   Product Purchased, Date of Purchase, Ticket Status, First Response Time,
//!   Time to Resolution, Customer Satisfaction Rating, Pred_Breach_Prob
//! Only the ID and priority columns are mandatory; the others default to
//! empty / missing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sla_core::ticket::Ticket;
use std::io::Read;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Deserialize)]
struct TicketRecord {
    #[serde(rename = "Ticket ID")]
    id: String,
    #[serde(rename = "Ticket Priority")]
    priority: String,
    #[serde(rename = "Ticket Type", default)]
    ticket_type: String,
    #[serde(rename = "Ticket Channel", default)]
    channel: String,
    #[serde(rename = "Product Purchased", default)]
    product: String,
    #[serde(rename = "Date of Purchase", default, deserialize_with = "deserialize_date")]
    purchase_date: Option<NaiveDate>,
    #[serde(rename = "Ticket Status", default)]
    status: String,
    #[serde(rename = "First Response Time", default, deserialize_with = "deserialize_timestamp")]
    first_response_at: Option<NaiveDateTime>,
    #[serde(rename = "Time to Resolution", default, deserialize_with = "deserialize_timestamp")]
    resolved_at: Option<NaiveDateTime>,
    #[serde(rename = "Customer Satisfaction Rating", default)]
    satisfaction_rating: Option<f64>,
    #[serde(rename = "Pred_Breach_Prob", default)]
    predicted_breach_probability: Option<f64>,
}

impl TicketRecord {
    fn into_ticket(self) -> Ticket {
        Ticket {
            id: self.id,
            priority: self.priority,
            ticket_type: self.ticket_type,
            channel: self.channel,
            product: self.product,
            status: self.status,
            purchase_date: self.purchase_date,
            first_response_at: self.first_response_at,
            resolved_at: self.resolved_at,
            satisfaction_rating: self.satisfaction_rating,
            predicted_breach_probability: self.predicted_breach_probability,
        }
    }
}

/// Load tickets from a CSV reader.
pub fn load_tickets<R: Read>(reader: R) -> anyhow::Result<Vec<Ticket>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut tickets = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: TicketRecord = result
            .map_err(|e| anyhow::anyhow!("CSV parse error at line {}: {e}", line_num + 2))?;
        tickets.push(record.into_ticket());
    }
    Ok(tickets)
}

/// Load tickets from a CSV file path.
pub fn load_tickets_file(path: &str) -> anyhow::Result<Vec<Ticket>> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open '{path}': {e}"))?;
    let tickets = load_tickets(file)?;
    log::info!("Loaded {} tickets from {path}", tickets.len());
    Ok(tickets)
}

/// Empty cells are missing timestamps; anything else must parse.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{s}'")))
}

/// Plain dates, or the date part of a full timestamp.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|t| t.date())
        })
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date '{s}'")))
}
