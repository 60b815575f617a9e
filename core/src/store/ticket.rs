use super::ExportStore;
use crate::{error::SlaResult, ticket::EnrichedTicket};
use chrono::NaiveDateTime;
use rusqlite::params;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: Option<NaiveDateTime>) -> Option<String> {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

impl ExportStore {
    // ── Enriched tickets ───────────────────────────────────────────

    /// Write the whole enriched table in one transaction.
    pub fn save_enriched(&self, run_id: &str, tickets: &[EnrichedTicket]) -> SlaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO enriched_ticket (
                    run_id, row_index, ticket_id, priority, ticket_type, channel, product,
                    status, purchase_date, first_response_at, resolved_at, resolution_hours,
                    sla_target_hours, is_breach, breach_cost, response_order_anomaly,
                    predicted_breach_probability
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for (i, e) in tickets.iter().enumerate() {
                let t = &e.ticket;
                stmt.execute(params![
                    run_id,
                    i as i64,
                    &t.id,
                    &t.priority,
                    &t.ticket_type,
                    &t.channel,
                    &t.product,
                    &t.status,
                    t.purchase_date.map(|d| d.to_string()),
                    format_ts(t.first_response_at),
                    format_ts(t.resolved_at),
                    e.resolution_hours,
                    e.sla_target_hours,
                    if e.is_breach { 1i32 } else { 0i32 },
                    e.breach_cost,
                    if e.response_order_anomaly { 1i32 } else { 0i32 },
                    t.predicted_breach_probability,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Exported {} enriched tickets for {run_id}", tickets.len());
        Ok(())
    }

    pub fn enriched_count(&self, run_id: &str) -> SlaResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM enriched_ticket WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn breach_count(&self, run_id: &str) -> SlaResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM enriched_ticket WHERE run_id = ?1 AND is_breach = 1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn total_breach_cost(&self, run_id: &str) -> SlaResult<f64> {
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(breach_cost) FROM enriched_ticket WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }
}
