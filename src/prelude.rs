//! Convenient imports for common functionality.
//!
//! Re-exports the types most callers need to open a connection and run commands.

pub use crate::config::{ConnectorOptions, ConnectorOptionsBuilder, RetryPolicy};
pub use crate::connection::Connection;
pub use crate::connector::SqlConnector;
pub use crate::error::{ConnectorError, RowError};
pub use crate::row::Row;
