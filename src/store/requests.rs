use chrono::Utc;
use rusqlite::params;

use super::*;

impl RecordStore {
    pub fn insert_request(
        &self,
        name: &str,
        client: &str,
        description: Option<&str>,
        devs_amount: Option<&str>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO requests (name, client, description, devs_amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, client, description, devs_amount, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_store;

    #[test]
    fn test_insert_request_stores_optional_fields() {
        let store = test_store();
        store
            .insert_request("Request - 123 - PHP", "AcmeCorp", Some("Urgent"), Some("2"))
            .expect("insert");
        store
            .insert_request("Request - 124 - Go", "Globex", None, None)
            .expect("insert");

        let (description, devs_amount): (Option<String>, Option<String>) = store
            .conn_ref()
            .query_row(
                "SELECT description, devs_amount FROM requests WHERE client = 'Globex'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("row");
        assert!(description.is_none());
        assert!(devs_amount.is_none());
    }
}
