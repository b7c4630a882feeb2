use rusqlite::{params, Row};

use super::*;

const DEVELOPER_COLUMNS: &str =
    "id, first_name_ru, last_name_ru, first_name_en, last_name_en, email, space";

/// Minimum Jaro-Winkler similarity for a fuzzy name match.
const FUZZY_THRESHOLD: f64 = 0.85;

fn map_developer(row: &Row<'_>) -> rusqlite::Result<DeveloperRecord> {
    Ok(DeveloperRecord {
        id: row.get(0)?,
        first_name_ru: row.get(1)?,
        last_name_ru: row.get(2)?,
        first_name_en: row.get(3)?,
        last_name_en: row.get(4)?,
        email: row.get(5)?,
        space: row.get(6)?,
    })
}

impl RecordStore {
    /// Insert a fully described developer. Used by seeding and tests;
    /// webhook traffic only ever creates stubs.
    pub fn insert_developer(
        &self,
        first_ru: &str,
        last_ru: &str,
        first_en: &str,
        last_en: &str,
        email: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO developers
                (first_name_ru, last_name_ru, first_name_en, last_name_en, email)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![first_ru, last_ru, first_en, last_en, email],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Minimal row for a candidate the store has never seen.
    pub fn insert_developer_stub(
        &self,
        first_ru: &str,
        last_ru: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO developers (first_name_ru, last_name_ru) VALUES (?1, ?2)",
            params![first_ru, last_ru],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Link a mentor to a developer. `position` keeps the mentor list
    /// ordered the way it was declared.
    pub fn add_mentor(
        &self,
        developer_id: i64,
        mentor_id: i64,
        position: i64,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO developer_mentors (developer_id, mentor_id, position)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(developer_id, mentor_id) DO UPDATE SET
                position = excluded.position",
            params![developer_id, mentor_id, position],
        )?;
        Ok(())
    }

    pub fn all_developers(&self) -> Result<Vec<DeveloperRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEVELOPER_COLUMNS} FROM developers ORDER BY id"
        ))?;
        let rows = stmt.query_map([], map_developer)?;

        let mut developers = Vec::new();
        for row in rows {
            developers.push(row?);
        }
        Ok(developers)
    }

    /// Find a developer by Russian first/last name: exact pair first,
    /// then the best Jaro-Winkler match over all developers.
    pub fn find_developer_fuzzy(
        &self,
        first_ru: &str,
        last_ru: &str,
    ) -> Result<Option<DeveloperRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEVELOPER_COLUMNS} FROM developers
             WHERE first_name_ru = ?1 AND last_name_ru = ?2"
        ))?;
        let mut rows = stmt.query_map(params![first_ru, last_ru], map_developer)?;
        if let Some(row) = rows.next() {
            return Ok(Some(row?));
        }

        let query = format!("{} {}", first_ru, last_ru).to_lowercase();
        let mut best: Option<(f64, DeveloperRecord)> = None;
        for developer in self.all_developers()? {
            let score =
                strsim::jaro_winkler(&query, &developer.full_name_ru().to_lowercase());
            if score < FUZZY_THRESHOLD {
                continue;
            }
            match &best {
                Some((top, _)) if *top >= score => {}
                _ => best = Some((score, developer)),
            }
        }
        Ok(best.map(|(_, developer)| developer))
    }

    /// Exact match on the Russian or English last name, and the first
    /// name too when one was given.
    pub fn find_developer_exact(
        &self,
        last_name: &str,
        first_name: Option<&str>,
    ) -> Result<Option<DeveloperRecord>, StoreError> {
        let (sql, lookup): (String, Vec<&str>) = match first_name {
            Some(first) => (
                format!(
                    "SELECT {DEVELOPER_COLUMNS} FROM developers
                     WHERE (LOWER(last_name_ru) = LOWER(?1) OR LOWER(last_name_en) = LOWER(?1))
                       AND (LOWER(first_name_ru) = LOWER(?2) OR LOWER(first_name_en) = LOWER(?2))"
                ),
                vec![last_name, first],
            ),
            None => (
                format!(
                    "SELECT {DEVELOPER_COLUMNS} FROM developers
                     WHERE LOWER(last_name_ru) = LOWER(?1) OR LOWER(last_name_en) = LOWER(?1)"
                ),
                vec![last_name],
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(rusqlite::params_from_iter(lookup), map_developer)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Mentors of a developer, in declared order.
    pub fn mentors_of(&self, developer_id: i64) -> Result<Vec<DeveloperRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.first_name_ru, d.last_name_ru, d.first_name_en,
                    d.last_name_en, d.email, d.space
             FROM developers d
             JOIN developer_mentors m ON m.mentor_id = d.id
             WHERE m.developer_id = ?1
             ORDER BY m.position",
        )?;
        let rows = stmt.query_map(params![developer_id], map_developer)?;

        let mut mentors = Vec::new();
        for row in rows {
            mentors.push(row?);
        }
        Ok(mentors)
    }

    /// Bind a developer's direct-message space, matching by English
    /// first/last name. Returns `false` when no developer matched.
    pub fn bind_developer_space(
        &self,
        first_en: &str,
        last_en: &str,
        space_id: &str,
    ) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            "UPDATE developers SET space = ?3
             WHERE LOWER(first_name_en) = LOWER(?1) AND LOWER(last_name_en) = LOWER(?2)",
            params![first_en, last_en, space_id],
        )?;
        Ok(rows > 0)
    }
}
