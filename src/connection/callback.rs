#![allow(unsafe_code)]

use std::any::Any;
use std::ffi::CStr;
use std::fmt::Display;
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use crate::engine::{Engine, status};
use crate::error::ConnectorError;
use crate::row::Row;

use super::handle::{Attempt, Connection, c_command};
use super::retry::{EngineStatus, with_busy_retry};

/// Row handler with the error already rendered; receives the 1-based trial number.
type ErasedRowFn<'f> = dyn FnMut(usize, &Row<'_>) -> Result<(), String> + 'f;

/// Why the adaptor told the engine to stop.
enum Failure {
    Error(String),
    Panic(Box<dyn Any + Send>),
}

/// Handed to the engine as the opaque context of a single attempt.
struct CallbackContext<'a, 'f> {
    on_row: &'a mut ErasedRowFn<'f>,
    trial: usize,
    failure: Option<Failure>,
}

struct BridgedAttempt {
    attempt: Attempt,
    trial: usize,
    failure: Option<Failure>,
}

impl EngineStatus for BridgedAttempt {
    fn status(&self) -> c_int {
        self.attempt.status
    }
}

/// The only function the engine calls back into.
///
/// Every failure of the host callback, panics included, is caught here and
/// parked in the context; the engine only ever sees `0` or `ABORT`.
unsafe extern "C" fn row_adaptor(
    context: *mut c_void,
    argc: c_int,
    argv: *mut *mut c_char,
    names: *mut *mut c_char,
) -> c_int {
    // SAFETY: `context` is the `CallbackContext` passed to `exec_once` by `run_callback`,
    // which outlives the engine call.
    let ctx = unsafe { &mut *context.cast::<CallbackContext<'_, '_>>() };
    let trial = ctx.trial;
    let on_row = &mut *ctx.on_row;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the engine passes `argc` column pointers that live for this call.
        let row = unsafe { Row::new(columns(argc, argv), columns(argc, names)) };
        on_row(trial, &row)
    }));
    match result {
        Ok(Ok(())) => 0,
        Ok(Err(message)) => {
            ctx.failure = Some(Failure::Error(message));
            status::ABORT
        }
        Err(payload) => {
            ctx.failure = Some(Failure::Panic(payload));
            status::ABORT
        }
    }
}

/// # Safety
///
/// `ptrs` must be null or point to `argc` entries, each null or NUL-terminated.
unsafe fn columns<'a>(argc: c_int, ptrs: *mut *mut c_char) -> Vec<Option<&'a CStr>> {
    let len = usize::try_from(argc).unwrap_or(0);
    if ptrs.is_null() {
        return vec![None; len];
    }
    // SAFETY: see the function contract.
    unsafe { slice::from_raw_parts(ptrs, len) }
        .iter()
        .map(|&p| {
            if p.is_null() {
                None
            } else {
                // SAFETY: non-null entries are NUL-terminated engine strings.
                Some(unsafe { CStr::from_ptr(p) })
            }
        })
        .collect()
}

impl<E: Engine> Connection<E> {
    /// Run `command`, calling `on_row` for every result row in engine order.
    ///
    /// If `on_row` returns an error the engine stops delivering rows and the call
    /// fails with [`ConnectorError::Callback`] carrying that error's message. A
    /// panic inside `on_row` is caught before it reaches the engine and resumed
    /// here once the engine has returned.
    ///
    /// Busy retries re-run the whole statement, so rows seen during an attempt
    /// that ended busy are delivered again from the start.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Callback`] if `on_row` failed, otherwise
    /// [`ConnectorError::Sql`] if the engine failed.
    pub fn execute_callback<F, CbError>(
        &mut self,
        command: &str,
        mut on_row: F,
    ) -> Result<(), ConnectorError>
    where
        F: FnMut(&Row<'_>) -> Result<(), CbError>,
        CbError: Display,
    {
        self.run_callback(command, &mut |_, row| on_row(row).map_err(|e| e.to_string()))?;
        Ok(())
    }

    /// Collect every row of `command` as owned text.
    ///
    /// Rows from an attempt that ended busy are discarded, so the result holds
    /// exactly the rows of the attempt that completed.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Sql`] if the engine failed.
    pub fn query_rows(
        &mut self,
        command: &str,
    ) -> Result<Vec<Vec<Option<String>>>, ConnectorError> {
        let mut rows = Vec::new();
        let mut rows_trial = 1;
        let final_trial = self.run_callback(command, &mut |trial, row| {
            if trial != rows_trial {
                rows.clear();
                rows_trial = trial;
            }
            rows.push(row.to_vec());
            Ok(())
        })?;
        // the completed attempt may have produced no rows at all
        if final_trial != rows_trial {
            rows.clear();
        }
        Ok(rows)
    }

    /// Returns the trial number of the attempt that completed.
    fn run_callback(
        &mut self,
        command: &str,
        on_row: &mut ErasedRowFn<'_>,
    ) -> Result<usize, ConnectorError> {
        let sql = c_command(command)?;
        let policy = self.retry;
        let outcome = with_busy_retry(&policy, command, |trial| {
            let mut ctx = CallbackContext {
                on_row: &mut *on_row,
                trial,
                failure: None,
            };
            let context = std::ptr::from_mut(&mut ctx).cast::<c_void>();
            // SAFETY: `ctx` lives on this frame until exec_once returns, and
            // `row_adaptor` is the only reader of the context.
            let attempt = unsafe { self.exec_once(&sql, Some(row_adaptor), context) };
            BridgedAttempt {
                attempt,
                trial,
                failure: ctx.failure,
            }
        });

        let BridgedAttempt {
            attempt,
            trial,
            failure,
        } = outcome;
        if attempt.status == status::OK {
            return Ok(trial);
        }
        match failure {
            Some(Failure::Panic(payload)) => panic::resume_unwind(payload),
            Some(Failure::Error(message)) => {
                tracing::debug!(command, %message, "row callback aborted statement");
                Err(ConnectorError::Callback {
                    message,
                    command: command.to_string(),
                })
            }
            None => Err(self.sql_error(attempt, command)),
        }
    }
}
