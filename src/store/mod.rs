//! SQLite record store for staffing state.
//!
//! The database lives at `~/.staffbot/staffbot.db` by default and holds
//! the durable side of the workflow: developers with their mentor
//! links, clients, requests, interviews, and preparation rows. Records
//! are read fresh on every command; nothing is cached across webhook
//! invocations.

use std::path::PathBuf;

use rusqlite::Connection;

pub mod types;
pub use types::*;

mod clients;
mod developers;
mod interviews;
mod preparations;
mod requests;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS developers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name_ru TEXT NOT NULL DEFAULT '',
    last_name_ru TEXT NOT NULL DEFAULT '',
    first_name_en TEXT NOT NULL DEFAULT '',
    last_name_en TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    space TEXT
);

CREATE TABLE IF NOT EXISTS developer_mentors (
    developer_id INTEGER NOT NULL REFERENCES developers(id),
    mentor_id INTEGER NOT NULL REFERENCES developers(id),
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (developer_id, mentor_id)
);

CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    client TEXT NOT NULL,
    description TEXT,
    devs_amount TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    dev TEXT NOT NULL,
    client TEXT NOT NULL,
    request TEXT NOT NULL,
    result TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS preparations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_name TEXT NOT NULL,
    client_name TEXT NOT NULL,
    dev TEXT NOT NULL,
    cv TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
";

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the database at an explicit path and apply the
    /// schema. The path comes from config; tests pass a temp dir.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }
}
