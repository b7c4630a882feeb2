//! Shared type definitions for the record store.

use thiserror::Error;

/// Errors specific to store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

/// A row from the `developers` table.
#[derive(Debug, Clone)]
pub struct DeveloperRecord {
    pub id: i64,
    pub first_name_ru: String,
    pub last_name_ru: String,
    pub first_name_en: String,
    pub last_name_en: String,
    pub email: String,
    pub space: Option<String>,
}

impl DeveloperRecord {
    pub fn full_name_ru(&self) -> String {
        format!("{} {}", self.first_name_ru, self.last_name_ru)
    }

    pub fn full_name_en(&self) -> String {
        format!("{} {}", self.first_name_en, self.last_name_en)
    }
}

/// A row from the `clients` table.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
}

/// A row from the `interviews` table.
#[derive(Debug, Clone)]
pub struct InterviewRecord {
    pub id: i64,
    pub dev: String,
    pub client: String,
    pub request: String,
    pub result: Option<String>,
    pub created_at: String,
}

/// A row from the `preparations` table.
#[derive(Debug, Clone)]
pub struct PreparationRecord {
    pub id: i64,
    pub request_name: String,
    pub client_name: String,
    pub dev: String,
    pub cv: String,
    pub created_at: String,
}

/// What `record_result` did with an incoming result text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    /// An open interview row was updated.
    Updated,
    /// No row existed for the key, so one was inserted.
    Inserted,
    /// The key already carries a result; the write was dropped.
    AlreadySet,
}
