#![allow(unsafe_code, dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::rc::Rc;
use std::time::Duration;

use sqlite_connector::engine::status;
use sqlite_connector::{
    Connection, ConnectorError, ConnectorOptions, Engine, ExecCallback, RetryPolicy,
};

/// What the fake engine does on one `exec` call.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver every scripted row, then succeed.
    Rows,
    /// Report busy without delivering anything.
    Busy,
    /// Deliver the first `n` rows, then report busy.
    BusyAfter(usize),
    /// Fail with `code` and an engine-allocated message.
    Fail(c_int, &'static str),
    /// Fail with `code` and no message at all.
    FailSilently(c_int),
}

/// Shared instrumentation, still readable after the connection is dropped.
#[derive(Debug, Default)]
pub struct Counters {
    pub exec_calls: Cell<usize>,
    pub messages_allocated: Cell<usize>,
    pub messages_freed: Cell<usize>,
    pub rows_delivered: Cell<usize>,
    pub commands: RefCell<Vec<String>>,
    pub closed: Cell<bool>,
}

impl Counters {
    pub fn leaked_messages(&self) -> usize {
        self.messages_allocated.get() - self.messages_freed.get()
    }
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

/// Scripted stand-in for the native engine.
///
/// Once the script runs out every call behaves like [`Step::Rows`].
pub struct FakeEngine {
    script: VecDeque<Step>,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    counters: Rc<Counters>,
}

impl FakeEngine {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            columns: Vec::new(),
            rows: Vec::new(),
            counters: Rc::default(),
        }
    }

    pub fn with_rows(mut self, columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        self.columns = columns.iter().map(ToString::to_string).collect();
        self.rows = rows
            .iter()
            .map(|row| row.iter().map(|v| v.map(ToString::to_string)).collect())
            .collect();
        self
    }

    pub fn counters(&self) -> Rc<Counters> {
        Rc::clone(&self.counters)
    }

    fn store_message(&self, errmsg: *mut *mut c_char, text: &str) {
        let owned = CString::new(text).expect("fake messages have no NUL");
        // SAFETY: the connector hands in a valid out-pointer.
        unsafe { *errmsg = owned.into_raw() };
        bump(&self.counters.messages_allocated);
    }

    /// Deliver up to `limit` rows; `false` if the callback asked to stop.
    fn deliver(&self, limit: usize, callback: Option<ExecCallback>, context: *mut c_void) -> bool {
        let Some(callback) = callback else {
            return true;
        };
        let names: Vec<CString> = self
            .columns
            .iter()
            .map(|c| CString::new(c.as_str()).expect("column name"))
            .collect();
        let mut name_ptrs: Vec<*mut c_char> = names.iter().map(|c| c.as_ptr().cast_mut()).collect();
        for row in self.rows.iter().take(limit) {
            let values: Vec<Option<CString>> = row
                .iter()
                .map(|v| v.as_deref().map(|s| CString::new(s).expect("column value")))
                .collect();
            let mut value_ptrs: Vec<*mut c_char> = values
                .iter()
                .map(|v| v.as_ref().map_or(ptr::null_mut(), |c| c.as_ptr().cast_mut()))
                .collect();
            bump(&self.counters.rows_delivered);
            let argc = c_int::try_from(value_ptrs.len()).expect("column count");
            // SAFETY: pointers stay alive for the duration of the call.
            let rc = unsafe {
                callback(context, argc, value_ptrs.as_mut_ptr(), name_ptrs.as_mut_ptr())
            };
            if rc != 0 {
                return false;
            }
        }
        true
    }
}

impl Engine for FakeEngine {
    fn open(options: &ConnectorOptions) -> Result<Self, ConnectorError> {
        if options.db_path.contains("unopenable") {
            return Err(ConnectorError::Open {
                path: options.db_path.clone(),
                message: "unable to open database file".into(),
            });
        }
        Ok(Self::new([]))
    }

    unsafe fn exec(
        &mut self,
        sql: &CStr,
        callback: Option<ExecCallback>,
        context: *mut c_void,
        errmsg: *mut *mut c_char,
    ) -> c_int {
        bump(&self.counters.exec_calls);
        self.counters
            .commands
            .borrow_mut()
            .push(sql.to_string_lossy().into_owned());
        match self.script.pop_front().unwrap_or(Step::Rows) {
            Step::Rows => {
                if self.deliver(usize::MAX, callback, context) {
                    status::OK
                } else {
                    self.store_message(errmsg, "query aborted");
                    status::ABORT
                }
            }
            Step::Busy => {
                self.store_message(errmsg, "database is locked");
                status::BUSY
            }
            Step::BusyAfter(n) => {
                if self.deliver(n, callback, context) {
                    self.store_message(errmsg, "database is locked");
                    status::BUSY
                } else {
                    self.store_message(errmsg, "query aborted");
                    status::ABORT
                }
            }
            Step::Fail(code, text) => {
                self.store_message(errmsg, text);
                code
            }
            Step::FailSilently(code) => code,
        }
    }

    unsafe fn free_message(&self, message: *mut c_char) {
        // SAFETY: every message handed out came from `CString::into_raw`.
        drop(unsafe { CString::from_raw(message) });
        bump(&self.counters.messages_freed);
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.counters.closed.set(true);
    }
}

/// Connection over a fake engine with a zero-delay default-sized retry budget.
pub fn fake_connection(engine: FakeEngine) -> (Connection<FakeEngine>, Rc<Counters>) {
    let counters = engine.counters();
    let policy = RetryPolicy::default().with_retry_delay(Duration::ZERO);
    (Connection::from_engine(engine, policy), counters)
}
