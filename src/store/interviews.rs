use chrono::Utc;
use rusqlite::{params, Row};

use super::*;

fn map_interview(row: &Row<'_>) -> rusqlite::Result<InterviewRecord> {
    Ok(InterviewRecord {
        id: row.get(0)?,
        dev: row.get(1)?,
        client: row.get(2)?,
        request: row.get(3)?,
        result: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl RecordStore {
    /// Scheduled interview, result still open.
    pub fn insert_interview(
        &self,
        dev: &str,
        client: &str,
        request: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO interviews (dev, client, request, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![dev, client, request, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Attach a result to the interview keyed by {dev, request}.
    ///
    /// Set-once: an open row is updated, a missing row is inserted with
    /// the result already filled in, and a row that carries a result
    /// keeps it. Re-posting the same command therefore changes nothing.
    pub fn record_result(
        &self,
        dev: &str,
        request: &str,
        client: &str,
        result: &str,
    ) -> Result<ResultOutcome, StoreError> {
        let updated = self.conn.execute(
            "UPDATE interviews SET result = ?3
             WHERE dev = ?1 AND request = ?2
               AND (result IS NULL OR result = '')",
            params![dev, request, result],
        )?;
        if updated > 0 {
            return Ok(ResultOutcome::Updated);
        }

        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM interviews WHERE dev = ?1 AND request = ?2",
            params![dev, request],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(ResultOutcome::AlreadySet);
        }

        self.conn.execute(
            "INSERT INTO interviews (dev, client, request, result, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![dev, client, request, result, Utc::now().to_rfc3339()],
        )?;
        Ok(ResultOutcome::Inserted)
    }

    pub fn interviews_for_client(
        &self,
        client: &str,
    ) -> Result<Vec<InterviewRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, dev, client, request, result, created_at
             FROM interviews WHERE client = ?1
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![client], map_interview)?;

        let mut interviews = Vec::new();
        for row in rows {
            interviews.push(row?);
        }
        Ok(interviews)
    }
}
