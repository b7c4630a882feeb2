use rusqlite::params;

use super::*;

/// Minimum Jaro-Winkler similarity for a fuzzy client match.
const FUZZY_THRESHOLD: f64 = 0.85;

impl RecordStore {
    pub fn insert_client(&self, name: &str) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO clients (name) VALUES (?1)
             ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find a client by name: case-insensitive exact match first, then
    /// the best Jaro-Winkler match over all clients.
    pub fn find_client_fuzzy(&self, name: &str) -> Result<Option<ClientRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM clients WHERE LOWER(name) = LOWER(?1)")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(ClientRecord {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        if let Some(row) = rows.next() {
            return Ok(Some(row?));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM clients ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ClientRecord {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let query = name.to_lowercase();
        let mut best: Option<(f64, ClientRecord)> = None;
        for row in rows {
            let client = row?;
            let score = strsim::jaro_winkler(&query, &client.name.to_lowercase());
            if score < FUZZY_THRESHOLD {
                continue;
            }
            match &best {
                Some((top, _)) if *top >= score => {}
                _ => best = Some((score, client)),
            }
        }
        Ok(best.map(|(_, client)| client))
    }
}
