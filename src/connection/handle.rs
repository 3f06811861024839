use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::config::{ConnectorOptions, RetryPolicy};
use crate::engine::{Engine, EngineMessage, ExecCallback, Sqlite3, status};
use crate::error::ConnectorError;

use super::retry::EngineStatus;

/// A single opened database handle plus the busy-retry policy applied to it.
///
/// The connection exclusively owns its engine; dropping it closes the handle.
/// Execution methods take `&mut self`, so one connection runs one command at a
/// time. Open several connections to share a database file.
pub struct Connection<E: Engine = Sqlite3> {
    pub(crate) engine: E,
    pub(crate) retry: RetryPolicy,
}

/// What one engine call left behind, with the diagnostic already copied and freed.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) status: c_int,
    pub(crate) message: Option<String>,
}

impl EngineStatus for Attempt {
    fn status(&self) -> c_int {
        self.status
    }
}

impl Connection<Sqlite3> {
    /// Open (creating if needed) the `SQLite` database at `path` with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Open`] if `SQLite` cannot open the file.
    pub fn open(path: impl Into<String>) -> Result<Self, ConnectorError> {
        Self::open_with(&ConnectorOptions::new(path))
    }
}

impl<E: Engine> Connection<E> {
    /// Open a connection described by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Open`] if the engine reports failure; no
    /// connection is created in that case.
    pub fn open_with(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        let engine = E::open(options)?;
        Ok(Self::from_engine(engine, options.retry))
    }

    /// Wrap an already opened engine.
    #[must_use]
    pub fn from_engine(engine: E, retry: RetryPolicy) -> Self {
        Self { engine, retry }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Close the handle now. Close failures are logged, never returned.
    pub fn close(self) {
        drop(self);
    }

    /// Run one engine call and release its diagnostic before returning.
    ///
    /// # Safety
    ///
    /// `context` must be valid for `callback` for the duration of the call.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn exec_once(
        &mut self,
        sql: &CStr,
        callback: Option<ExecCallback>,
        context: *mut c_void,
    ) -> Attempt {
        let mut errmsg: *mut c_char = ptr::null_mut();
        // SAFETY: context validity is the caller's promise; errmsg is a fresh null slot.
        let status = unsafe { self.engine.exec(sql, callback, context, &mut errmsg) };
        // SAFETY: whatever exec stored in errmsg belongs to this engine.
        let message = unsafe { EngineMessage::take(&self.engine, &mut errmsg) };
        Attempt {
            status,
            message: message.text(),
        }
    }

    pub(crate) fn sql_error(&self, attempt: Attempt, command: &str) -> ConnectorError {
        let Attempt { status, message } = attempt;
        ConnectorError::Sql {
            code: status,
            message: message.unwrap_or_else(|| self.engine.describe(status)),
            command: command.to_string(),
        }
    }
}

impl<E: Engine> fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("engine", &std::any::type_name::<E>())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Command text as the engine wants it.
pub(crate) fn c_command(command: &str) -> Result<CString, ConnectorError> {
    CString::new(command).map_err(|_| ConnectorError::Sql {
        code: status::ERROR,
        message: "command contains an interior NUL byte".into(),
        command: command.to_string(),
    })
}
