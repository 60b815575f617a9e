//! SQLite export layer.
//!
//! RULE: Only store code talks to the database.
//! The derivation and simulation stages never touch it; exporting is an
//! optional last step for downstream dashboards.

use rusqlite::{Connection, params};
use crate::{error::SlaResult, types::RunId};

mod simulation;
mod ticket;

pub struct ExportStore {
    conn: Connection,
}

impl ExportStore {
    /// Open (or create) the export database at `path`.
    pub fn open(path: &str) -> SlaResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SlaResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SlaResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_export.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn new_run_id() -> RunId {
        format!("run-{}", uuid::Uuid::new_v4())
    }

    pub fn insert_run(&self, run_id: &str, version: &str, ticket_count: usize) -> SlaResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, ticket_count, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id,
                version,
                ticket_count as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn run_exists(&self, run_id: &str) -> SlaResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }
}
