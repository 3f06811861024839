use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use rusqlite::ffi;

use super::{Engine, ExecCallback};
use crate::config::ConnectorOptions;
use crate::error::ConnectorError;

/// `SQLite` engine driven directly through `sqlite3_exec`.
pub struct Sqlite3 {
    db: NonNull<ffi::sqlite3>,
}

// SAFETY: the bundled library is built threadsafe, and the handle is only used
// through `&mut self` so it is never touched from two threads at once.
unsafe impl Send for Sqlite3 {}

impl Sqlite3 {
    fn open_flags(options: &ConnectorOptions) -> c_int {
        if options.read_only {
            ffi::SQLITE_OPEN_READONLY
        } else {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
        }
    }
}

impl Engine for Sqlite3 {
    fn open(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        let open_error = |message: String| ConnectorError::Open {
            path: options.db_path.clone(),
            message,
        };
        let path = CString::new(options.db_path.as_str())
            .map_err(|_| open_error("path contains an interior NUL byte".into()))?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        // SAFETY: `path` is NUL-terminated and `db` is a valid out-pointer.
        let rc = unsafe {
            ffi::sqlite3_open_v2(path.as_ptr(), &mut db, Self::open_flags(options), ptr::null())
        };

        match NonNull::new(db) {
            Some(db) if rc == ffi::SQLITE_OK => {
                tracing::debug!(path = %options.db_path, "sqlite connection opened");
                Ok(Self { db })
            }
            handle => {
                let message = match handle {
                    // SAFETY: a non-null handle from a failed open still answers errmsg.
                    Some(h) => unsafe { lossy(ffi::sqlite3_errmsg(h.as_ptr())) },
                    None => errstr(rc),
                };
                // SAFETY: a failed open may still allocate a handle; close accepts null.
                unsafe { ffi::sqlite3_close(db) };
                Err(open_error(message))
            }
        }
    }

    unsafe fn exec(
        &mut self,
        sql: &CStr,
        callback: Option<ExecCallback>,
        context: *mut c_void,
        errmsg: *mut *mut c_char,
    ) -> c_int {
        // SAFETY: upheld by the caller per the trait contract.
        unsafe { ffi::sqlite3_exec(self.db.as_ptr(), sql.as_ptr(), callback, context, errmsg) }
    }

    unsafe fn free_message(&self, message: *mut c_char) {
        // SAFETY: `message` was allocated by sqlite3_exec.
        unsafe { ffi::sqlite3_free(message.cast()) };
    }

    fn describe(&self, code: c_int) -> String {
        errstr(code)
    }
}

impl Drop for Sqlite3 {
    fn drop(&mut self) {
        // SAFETY: the handle is valid and this is the only place it is closed.
        let rc = unsafe { ffi::sqlite3_close(self.db.as_ptr()) };
        if rc == ffi::SQLITE_OK {
            tracing::debug!("sqlite connection closed");
        } else {
            tracing::warn!(code = rc, reason = %errstr(rc), "sqlite close failed");
        }
    }
}

impl fmt::Debug for Sqlite3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sqlite3").field("db", &self.db).finish()
    }
}

fn errstr(code: c_int) -> String {
    // SAFETY: sqlite3_errstr returns a static string for any code.
    unsafe { lossy(ffi::sqlite3_errstr(code)) }
}

/// # Safety
///
/// `text` must be null or a NUL-terminated string.
unsafe fn lossy(text: *const c_char) -> String {
    if text.is_null() {
        return String::from("unknown error");
    }
    // SAFETY: checked non-null above; NUL termination is the caller's promise.
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}
