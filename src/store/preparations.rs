use chrono::Utc;
use rusqlite::params;

use super::*;

impl RecordStore {
    /// One row per candidate sent to a client.
    pub fn insert_preparation(
        &self,
        request_name: &str,
        client_name: &str,
        dev: &str,
        cv: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO preparations (request_name, client_name, dev, cv, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![request_name, client_name, dev, cv, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn preparations_for_client(
        &self,
        client: &str,
    ) -> Result<Vec<PreparationRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, request_name, client_name, dev, cv, created_at
             FROM preparations WHERE client_name = ?1
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![client], |row| {
            Ok(PreparationRecord {
                id: row.get(0)?,
                request_name: row.get(1)?,
                client_name: row.get(2)?,
                dev: row.get(3)?,
                cv: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut preparations = Vec::new();
        for row in rows {
            preparations.push(row?);
        }
        Ok(preparations)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_store;

    #[test]
    fn test_preparations_filter_by_client() {
        let store = test_store();
        store
            .insert_preparation("Request - 123", "AcmeCorp", "Иванов Иван", "https://cv/1")
            .expect("insert");
        store
            .insert_preparation("Request - 123", "AcmeCorp", "Петров Пётр", "https://cv/2")
            .expect("insert");
        store
            .insert_preparation("Request - 200", "Globex", "Сидоров Олег", "https://cv/3")
            .expect("insert");

        let rows = store.preparations_for_client("AcmeCorp").expect("query");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.client_name == "AcmeCorp"));

        assert!(store
            .preparations_for_client("Initech")
            .expect("query")
            .is_empty());
    }
}
