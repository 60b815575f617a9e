//! Bottleneck detection — tickets in the slow tail of resolution time.

use crate::{config::BottleneckConfig, ticket::EnrichedTicket, types::Hours};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckCell {
    pub ticket_type: String,
    pub channel: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckReport {
    pub quantile: f64,
    /// `None` when no ticket has a resolution time.
    pub threshold_hours: Option<Hours>,
    pub bottleneck_ids: Vec<String>,
    /// Sorted by (ticket_type, channel).
    pub by_type_and_channel: Vec<BottleneckCell>,
}

pub fn detect(tickets: &[EnrichedTicket], config: &BottleneckConfig) -> BottleneckReport {
    let hours: Vec<Hours> = tickets.iter().filter_map(|t| t.resolution_hours).collect();
    let threshold = quantile(&hours, config.quantile);

    let mut ids = Vec::new();
    let mut cells: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    if let Some(threshold) = threshold {
        for t in tickets {
            if t.resolution_hours.is_some_and(|h| h > threshold) {
                ids.push(t.id().to_string());
                *cells
                    .entry((t.ticket.ticket_type.as_str(), t.ticket.channel.as_str()))
                    .or_insert(0) += 1;
            }
        }
    }
    log::debug!("Bottleneck threshold {threshold:?}h flags {} tickets", ids.len());

    BottleneckReport {
        quantile: config.quantile,
        threshold_hours: threshold,
        bottleneck_ids: ids,
        by_type_and_channel: cells
            .into_iter()
            .map(|((ticket_type, channel), count)| BottleneckCell {
                ticket_type: ticket_type.to_string(),
                channel: channel.to_string(),
                count,
            })
            .collect(),
    }
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}
