// Engine module - the only place that speaks the native C API
//
// - sqlite3: production engine over `rusqlite::ffi`
// - message: scoped ownership of engine-allocated diagnostics

#![allow(unsafe_code)]

mod message;
mod sqlite3;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

use crate::config::ConnectorOptions;
use crate::error::ConnectorError;

pub(crate) use message::EngineMessage;
pub use sqlite3::Sqlite3;

/// Native status codes the connector reacts to.
pub mod status {
    use std::os::raw::c_int;

    use rusqlite::ffi;

    pub const OK: c_int = ffi::SQLITE_OK;
    pub const ERROR: c_int = ffi::SQLITE_ERROR;
    /// The only status that triggers a retry.
    pub const BUSY: c_int = ffi::SQLITE_BUSY;
    /// Returned by `exec` when a row callback asked it to stop.
    pub const ABORT: c_int = ffi::SQLITE_ABORT;
}

/// Row callback shape expected by the engine's `exec` primitive:
/// `(context, column_count, column_values, column_names) -> status`.
pub type ExecCallback =
    unsafe extern "C" fn(*mut c_void, c_int, *mut *mut c_char, *mut *mut c_char) -> c_int;

/// A native database engine behind a single opened handle.
///
/// Dropping the engine closes its handle. Implementations own exactly one handle
/// and must release it unconditionally on drop.
pub trait Engine: Sized {
    /// Open (or create) the database described by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Open`] carrying the engine diagnostic.
    fn open(options: &ConnectorOptions) -> Result<Self, ConnectorError>;

    /// Run `sql` to completion, invoking `callback` once per result row.
    ///
    /// On failure the engine may store a diagnostic in `*errmsg`; that pointer
    /// must later be handed to [`Engine::free_message`].
    ///
    /// # Safety
    ///
    /// `context` must be whatever `callback` expects and stay valid for the whole
    /// call. `errmsg` must point to writable storage holding a null pointer.
    unsafe fn exec(
        &mut self,
        sql: &CStr,
        callback: Option<ExecCallback>,
        context: *mut c_void,
        errmsg: *mut *mut c_char,
    ) -> c_int;

    /// Release a diagnostic produced by [`Engine::exec`].
    ///
    /// # Safety
    ///
    /// `message` must come from this engine's `exec` and must not have been freed.
    unsafe fn free_message(&self, message: *mut c_char);

    /// Fallback text for a status code when `exec` produced no diagnostic.
    fn describe(&self, code: c_int) -> String {
        format!("engine status {code}")
    }
}
