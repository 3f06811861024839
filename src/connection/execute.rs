use std::ptr;

use crate::engine::{Engine, status};
use crate::error::ConnectorError;

use super::handle::{Connection, c_command};
use super::retry::with_busy_retry;

impl<E: Engine> Connection<E> {
    /// Run `command` without a row callback, retrying while the database is busy.
    ///
    /// Several `;`-separated statements may be passed in one command; rows they
    /// produce are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Sql`] with the engine diagnostic and `command`
    /// if the engine fails, including when it is still busy after the last trial.
    #[allow(unsafe_code)]
    pub fn execute(&mut self, command: &str) -> Result<(), ConnectorError> {
        let sql = c_command(command)?;
        let policy = self.retry;
        let outcome = with_busy_retry(&policy, command, |_| {
            // SAFETY: no callback, so the null context is never read.
            unsafe { self.exec_once(&sql, None, ptr::null_mut()) }
        });
        if outcome.status == status::OK {
            Ok(())
        } else {
            Err(self.sql_error(outcome, command))
        }
    }
}
