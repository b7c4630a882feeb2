//! Staffbot: staffing workflow bot for Google Chat.
//!
//! Listens for Chat webhook events, parses structured commands out of
//! message text (Preparation, Request, Interview, Result), keeps the
//! staffing history in SQLite, and schedules request syncs and
//! interviews on Google Calendar.
//!
//! The binary (`src/main.rs`) wires the pieces together and serves the
//! webhook endpoint; everything else lives here so handlers can be
//! driven directly in tests.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod gateways;
pub mod handlers;
pub mod parser;
pub mod scheduling;
pub mod store;
