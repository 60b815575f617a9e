use super::ExportStore;
use crate::{
    error::SlaResult,
    simulator::{SimulationMetrics, SimulationResult},
};
use rusqlite::params;

impl ExportStore {
    // ── Simulation ─────────────────────────────────────────────────

    /// Persist metrics and per-ticket flags. Returns the new sim_id.
    pub fn save_simulation(&self, run_id: &str, result: &SimulationResult) -> SlaResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let m = &result.metrics;
        tx.execute(
            "INSERT INTO simulation (
                run_id, capacity, intervention_cost, tickets_reviewed, breaches_prevented,
                operational_cost, gross_savings, net_savings, roi, baseline_loss
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run_id,
                result.capacity.to_string(),
                result.intervention_cost,
                m.tickets_reviewed as i64,
                m.breaches_prevented as i64,
                m.operational_cost,
                m.gross_savings,
                m.net_savings,
                m.roi,
                m.baseline_loss,
            ],
        )?;
        let sim_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ticket_flag (sim_id, row_index, ticket_id, arrival_day, cohort_rank, is_flagged)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (i, f) in result.flags.iter().enumerate() {
                stmt.execute(params![
                    sim_id,
                    i as i64,
                    &f.ticket_id,
                    f.arrival_day.map(|d| d.to_string()),
                    f.cohort_rank.map(|r| r as i64),
                    if f.is_flagged { 1i32 } else { 0i32 },
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Exported simulation {sim_id} for {run_id}");
        Ok(sim_id)
    }

    pub fn flagged_count(&self, sim_id: i64) -> SlaResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM ticket_flag WHERE sim_id = ?1 AND is_flagged = 1",
            params![sim_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn simulation_metrics(&self, sim_id: i64) -> SlaResult<SimulationMetrics> {
        self.conn
            .query_row(
                "SELECT tickets_reviewed, breaches_prevented, operational_cost,
                        gross_savings, net_savings, roi, baseline_loss
                 FROM simulation WHERE sim_id = ?1",
                params![sim_id],
                |row| {
                    Ok(SimulationMetrics {
                        tickets_reviewed: row.get::<_, i64>(0)? as usize,
                        breaches_prevented: row.get::<_, i64>(1)? as usize,
                        operational_cost: row.get(2)?,
                        gross_savings: row.get(3)?,
                        net_savings: row.get(4)?,
                        roi: row.get(5)?,
                        baseline_loss: row.get(6)?,
                    })
                },
            )
            .map_err(Into::into)
    }
}
