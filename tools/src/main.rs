//! sla-runner: headless SLA triage runner.
//!
//! Usage:
//!   sla-runner --input tickets.csv --capacity 50 --intervention-cost 2
//!   sla-runner --input tickets.csv --data-dir ./data --db export.db --json

mod loader;

use anyhow::Result;
use sla_core::{
    config::SlaConfig,
    error::SlaError,
    pipeline::{self, PipelineReport, SlaPipeline},
    simulator::Capacity,
    store::ExportStore,
    types::PROBABILITY_COLUMN,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = arg_value(&args, "--input")
        .ok_or_else(|| anyhow::anyhow!("--input <tickets.csv> is required"))?;
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let db = arg_value(&args, "--db");
    let json = args.iter().any(|a| a == "--json");
    let top = parse_arg(&args, "--top", 10usize);

    let config = if Path::new(data_dir).is_dir() {
        SlaConfig::load(data_dir)?
    } else {
        log::warn!("Data dir {data_dir} not found; using built-in SLA policy");
        SlaConfig::standard()
    };

    let mut runner = SlaPipeline::new(&config)?;
    let capacity_arg = arg_value(&args, "--capacity");
    if let Some(raw) = capacity_arg {
        runner = runner.with_capacity(raw.parse::<Capacity>()?);
    }
    if let Some(raw) = arg_value(&args, "--intervention-cost") {
        let cost: f64 = raw
            .parse()
            .map_err(|_| anyhow::anyhow!("--intervention-cost expects a number, got '{raw}'"))?;
        runner = runner.with_intervention_cost(cost)?;
    }

    let tickets = loader::load_tickets_file(input)?;
    let report = runner.run(&tickets)?;

    require_simulation(&report, capacity_arg.is_some())?;

    if let Some(db) = db {
        let store = ExportStore::open(db)?;
        store.migrate()?;
        let run_id = pipeline::export(&store, &report, env!("CARGO_PKG_VERSION"))?;
        if !json {
            println!("Exported run {run_id} to {db}");
            println!();
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, top);
    }
    Ok(())
}

/// An explicit `--capacity` means the caller wants the simulation, so a
/// table without probabilities is an error rather than a skipped stage.
fn require_simulation(report: &PipelineReport, explicit_capacity: bool) -> Result<()> {
    if explicit_capacity && report.simulation.is_none() {
        return Err(SlaError::MissingColumn {
            column: PROBABILITY_COLUMN.to_string(),
        }
        .into());
    }
    Ok(())
}

fn print_summary(report: &PipelineReport, top: usize) {
    let s = &report.summary;
    println!("=== SLA SUMMARY ===");
    println!("  tickets:            {}", s.total_tickets);
    match s.avg_resolution_hours {
        Some(h) => println!("  avg resolution:     {h:.2} h"),
        None => println!("  avg resolution:     n/a"),
    }
    println!("  breach rate:        {:.2}%", s.breach_rate * 100.0);
    println!("  financial exposure: ${:.0}", s.total_breach_cost);
    if !report.timestamp_anomalies.is_empty() {
        println!("  order anomalies:    {}", report.timestamp_anomalies.len());
    }

    println!();
    println!("=== BREACH RATE BY PRIORITY ===");
    for g in &report.by_priority {
        println!(
            "  {:<10} {:>6} tickets | {:>6.1}% breach | ${:.0}",
            g.group,
            g.tickets,
            g.breach_rate * 100.0,
            g.breach_cost
        );
    }

    println!();
    println!("=== SCENARIOS ===");
    for o in &report.scenarios {
        println!("  {:<22} {:.2}%", o.scenario, o.breach_rate * 100.0);
    }

    if let Some(threshold) = report.bottlenecks.threshold_hours {
        println!();
        println!(
            "=== BOTTLENECKS (> P{:.0} = {threshold:.1} h) ===",
            report.bottlenecks.quantile * 100.0
        );
        println!("  tickets: {}", report.bottlenecks.bottleneck_ids.len());
    }

    let anomalies: Vec<_> = report.demand.anomalies().collect();
    if !anomalies.is_empty() {
        println!();
        println!("=== DEMAND ALERTS (> {:.1}/day) ===", report.demand.threshold);
        for d in anomalies {
            println!("  {} | {} tickets", d.day, d.volume);
        }
    }

    println!();
    println!("=== WATCHDOG ===");
    println!("  risk tickets:   {}", report.watchdog.alerts.len());
    println!("  exposure:       ${:.2}", report.watchdog.total_exposure);

    println!();
    match &report.simulation {
        None => println!("=== TRIAGE SIMULATION === (no {PROBABILITY_COLUMN} column)"),
        Some(sim) => {
            let m = &sim.metrics;
            println!("=== TRIAGE SIMULATION ({}) ===", sim.capacity);
            println!("  targeted reviews:   {}", m.tickets_reviewed);
            println!("  breaches prevented: {}", m.breaches_prevented);
            println!("  operations cost:    ${:.0}", m.operational_cost);
            println!("  net savings:        ${:.0} ({:.1}x ROI)", m.net_savings, m.roi);
            if let Some(budget) = sim.review_budget() {
                println!(
                    "  risk captured:      {:.1}% at {budget} reviews",
                    sim.fraction_captured_at(budget) * 100.0
                );
            }

            let kill_list = sim.kill_list(&report.tickets);
            if let Some(day) = sim.cohorts.last().map(|c| c.day) {
                println!();
                println!("=== KILL LIST {day} ===");
                for (t, probability) in kill_list.iter().take(top) {
                    println!(
                        "  {:<8} {:<10} {:>5.1}% | ${:.0}",
                        t.id(),
                        t.ticket.priority,
                        probability * 100.0,
                        t.breach_cost
                    );
                }
            }
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
