//! The triage pipeline — one batch run from raw tickets to report.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. SLA deriver
//!   2. Capacity simulator   (skipped when no probability column)
//!   3. Breakdown analytics
//!   4. Bottleneck detector
//!   5. Scenario evaluator
//!   6. Demand monitor
//!   7. Watchdog
//!
//! RULES:
//!   - Every stage reads the enriched table produced by stage 1
//!     (the watchdog reads the raw tickets).
//!   - Any stage error aborts the run. No partial report is returned.
//!   - Export to SQLite is a separate, optional step.

use crate::{
    analytics::{self, Dimension, ExecutiveSummary, GroupBreakdown, WeeklyCost},
    bottleneck::{self, BottleneckReport},
    config::SlaConfig,
    deriver::{timestamp_anomalies, SlaDeriver},
    error::{SlaError, SlaResult},
    monitoring::{self, DemandReport},
    scenario::{self, ScenarioOutcome},
    simulator::{Capacity, CapacitySimulator, SimulationResult},
    store::ExportStore,
    ticket::{EnrichedTicket, Ticket},
    types::{Money, RunId, TicketId},
    watchdog::{Watchdog, WatchdogReport},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub tickets: Vec<EnrichedTicket>,
    pub timestamp_anomalies: Vec<TicketId>,
    pub simulation: Option<SimulationResult>,
    pub summary: ExecutiveSummary,
    pub by_priority: Vec<GroupBreakdown>,
    pub by_ticket_type: Vec<GroupBreakdown>,
    pub by_channel: Vec<GroupBreakdown>,
    pub weekly_cost: Vec<WeeklyCost>,
    pub bottlenecks: BottleneckReport,
    pub scenarios: Vec<ScenarioOutcome>,
    pub demand: DemandReport,
    pub watchdog: WatchdogReport,
}

pub struct SlaPipeline<'a> {
    config: &'a SlaConfig,
    capacity: Capacity,
    intervention_cost: Money,
}

impl<'a> SlaPipeline<'a> {
    /// Build a pipeline using the capacity and intervention cost from config.
    pub fn new(config: &'a SlaConfig) -> SlaResult<Self> {
        let capacity = config.triage.daily_capacity.resolve()?;
        Ok(Self {
            config,
            capacity,
            intervention_cost: config.triage.intervention_cost,
        })
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_intervention_cost(mut self, cost: Money) -> SlaResult<Self> {
        if !(cost >= 0.0) {
            return Err(SlaError::InvalidInterventionCost { value: cost });
        }
        self.intervention_cost = cost;
        Ok(self)
    }

    pub fn run(&self, tickets: &[Ticket]) -> SlaResult<PipelineReport> {
        let enriched = SlaDeriver::new(&self.config.policy).derive(tickets)?;
        let anomalies = timestamp_anomalies(&enriched)
            .into_iter()
            .map(|t| t.id().to_string())
            .collect();

        let has_probabilities = tickets.iter().any(|t| t.predicted_breach_probability.is_some());
        let simulation = if has_probabilities {
            Some(CapacitySimulator::new(self.capacity, self.intervention_cost)?.simulate(&enriched)?)
        } else {
            log::info!("No breach probabilities supplied; skipping capacity simulation");
            None
        };

        let report = PipelineReport {
            timestamp_anomalies: anomalies,
            simulation,
            summary: analytics::executive_summary(&enriched),
            by_priority: analytics::breakdown_by(&enriched, Dimension::Priority),
            by_ticket_type: analytics::breakdown_by(&enriched, Dimension::TicketType),
            by_channel: analytics::breakdown_by(&enriched, Dimension::Channel),
            weekly_cost: analytics::weekly_cost_trend(&enriched),
            bottlenecks: bottleneck::detect(&enriched, &self.config.bottleneck),
            scenarios: scenario::evaluate(&self.config.scenarios, &enriched),
            demand: monitoring::monitor(&enriched, &self.config.monitoring),
            watchdog: Watchdog::new(&self.config.policy, &self.config.watchdog).scan(tickets)?,
            tickets: enriched,
        };
        Ok(report)
    }
}

/// Write a report's enriched table (and simulation, if any) as a new run.
pub fn export(store: &ExportStore, report: &PipelineReport, version: &str) -> SlaResult<RunId> {
    let run_id = ExportStore::new_run_id();
    store.insert_run(&run_id, version, report.tickets.len())?;
    store.save_enriched(&run_id, &report.tickets)?;
    if let Some(sim) = &report.simulation {
        store.save_simulation(&run_id, sim)?;
    }
    log::info!("Exported run {run_id}");
    Ok(run_id)
}
