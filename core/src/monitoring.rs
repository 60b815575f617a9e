//! Demand monitoring — daily ticket volume, rolling average, alert zone.
//!
//! Volume is bucketed by purchase date, falling back to arrival day for
//! rows exported without one.

use crate::{config::MonitoringConfig, ticket::EnrichedTicket};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub day: NaiveDate,
    pub volume: usize,
    /// `None` until the window has filled.
    pub rolling_avg: Option<f64>,
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandReport {
    pub mean_volume: f64,
    pub std_volume: f64,
    pub threshold: f64,
    pub days: Vec<DailyVolume>,
}

impl DemandReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &DailyVolume> {
        self.days.iter().filter(|d| d.is_anomaly)
    }
}

pub fn monitor(tickets: &[EnrichedTicket], config: &MonitoringConfig) -> DemandReport {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in tickets.iter().filter_map(|t| t.ticket.demand_day()) {
        *counts.entry(day).or_insert(0) += 1;
    }

    // Contiguous calendar: quiet days count as zero.
    let mut series: Vec<(NaiveDate, usize)> = Vec::new();
    if let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) {
        let mut day = first;
        while day <= last {
            series.push((day, counts.get(&day).copied().unwrap_or(0)));
            day += Duration::days(1);
        }
    }

    let volumes: Vec<f64> = series.iter().map(|&(_, v)| v as f64).collect();
    let n = volumes.len();
    let mean_volume = if n > 0 { volumes.iter().sum::<f64>() / n as f64 } else { 0.0 };
    // Sample standard deviation (n - 1).
    let std_volume = if n > 1 {
        let var = volumes.iter().map(|v| (v - mean_volume).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    let threshold = mean_volume + config.anomaly_sigma * std_volume;

    let window = config.rolling_window_days.max(1);
    let days = series
        .iter()
        .enumerate()
        .map(|(i, &(day, volume))| {
            let rolling_avg = (i + 1 >= window)
                .then(|| volumes[i + 1 - window..=i].iter().sum::<f64>() / window as f64);
            DailyVolume {
                day,
                volume,
                rolling_avg,
                is_anomaly: volume as f64 > threshold,
            }
        })
        .collect::<Vec<_>>();

    let report = DemandReport { mean_volume, std_volume, threshold, days };
    let anomalies = report.anomalies().count();
    if anomalies > 0 {
        log::warn!("{anomalies} days exceed the demand threshold {threshold:.1}");
    }
    report
}
