use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::{ConnectorError, RowError};
use crate::row::Row;

/// Command sink that query builders and mappers program against.
///
/// Object safe, so callers can hold a `Box<dyn SqlConnector>` without knowing
/// which engine is underneath.
pub trait SqlConnector {
    /// Run a command whose rows, if any, are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Sql`] if the engine rejects the command.
    fn execute(&mut self, command: &str) -> Result<(), ConnectorError>;

    /// Run a command and hand every result row to `on_row`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Callback`] if `on_row` failed, otherwise
    /// [`ConnectorError::Sql`] if the engine failed.
    fn execute_callback(
        &mut self,
        command: &str,
        on_row: &mut dyn FnMut(&Row<'_>) -> Result<(), RowError>,
    ) -> Result<(), ConnectorError>;
}

impl<E: Engine> SqlConnector for Connection<E> {
    fn execute(&mut self, command: &str) -> Result<(), ConnectorError> {
        Connection::execute(self, command)
    }

    fn execute_callback(
        &mut self,
        command: &str,
        on_row: &mut dyn FnMut(&Row<'_>) -> Result<(), RowError>,
    ) -> Result<(), ConnectorError> {
        Connection::execute_callback(self, command, on_row)
    }
}
