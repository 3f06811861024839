use std::os::raw::c_int;

use thiserror::Error;

/// Failures surfaced by [`Connection`](crate::Connection) operations.
///
/// Busy statuses are retried internally; whatever is still failing once the
/// retry budget is spent ends up here.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The engine could not open or create the database file.
    #[error("SQL error: Can't open database '{path}': {message}")]
    Open { path: String, message: String },

    /// The engine rejected the command, including "still busy" after all trials.
    #[error("SQL error: '{message}' at '{command}'")]
    Sql {
        code: c_int,
        message: String,
        command: String,
    },

    /// The row callback returned an error and the engine aborted the statement.
    #[error("SQL error: '{message}' at '{command}'")]
    Callback { message: String, command: String },
}

impl ConnectorError {
    /// Native status code for [`ConnectorError::Sql`], `None` for the other kinds.
    #[must_use]
    pub fn code(&self) -> Option<c_int> {
        match self {
            ConnectorError::Sql { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The command text the failure is attributed to, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            ConnectorError::Open { .. } => None,
            ConnectorError::Sql { command, .. } | ConnectorError::Callback { command, .. } => {
                Some(command)
            }
        }
    }

    /// Diagnostic text without the command context.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ConnectorError::Open { message, .. }
            | ConnectorError::Sql { message, .. }
            | ConnectorError::Callback { message, .. } => message,
        }
    }

    /// True when the engine was still reporting a busy database after the last trial.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.code() == Some(crate::engine::status::BUSY)
    }
}

/// Error type a row callback hands back through the [`SqlConnector`](crate::SqlConnector) seam.
pub type RowError = Box<dyn std::error::Error + Send + Sync>;
