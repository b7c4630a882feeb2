//! Error types for event processing.
//!
//! Each layer owns its own enum (`ParseError`, `StoreError`,
//! `GatewayError`); `BotError` unifies them at the dispatcher boundary.
//! Parse failures are answered in-thread with the "command not found"
//! notice; store and gateway failures are logged and end the command.

use thiserror::Error;

use crate::gateways::GatewayError;
use crate::parser::ParseError;
use crate::store::StoreError;

/// Top-level error for command handling.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl BotError {
    /// True when the failure came from user input rather than from the
    /// store or a vendor call. Only input errors get the "check your
    /// input" reply.
    pub fn is_input_error(&self) -> bool {
        matches!(self, BotError::Parse(_))
    }
}
