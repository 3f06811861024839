use std::time::Duration;

use crate::connection::Connection;
use crate::engine::Sqlite3;
use crate::error::ConnectorError;

/// Busy-retry budget applied to every execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_trials: usize,
    retry_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_TRIALS: usize = 16;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_micros(20);

    #[must_use]
    pub fn new(max_trials: usize, retry_delay: Duration) -> Self {
        Self {
            max_trials: max_trials.max(1),
            retry_delay,
        }
    }

    #[must_use]
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials.max(1);
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Total number of engine calls allowed per command, first attempt included.
    #[must_use]
    pub fn max_trials(&self) -> usize {
        self.max_trials
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_TRIALS, Self::DEFAULT_RETRY_DELAY)
    }
}

/// Options for opening a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub db_path: String,
    pub read_only: bool,
    pub retry: RetryPolicy,
}

impl ConnectorOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            read_only: false,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Fluent builder for [`ConnectorOptions`].
#[derive(Debug, Clone)]
pub struct ConnectorOptionsBuilder {
    opts: ConnectorOptions,
}

impl ConnectorOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: ConnectorOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn max_trials(mut self, max_trials: usize) -> Self {
        self.opts.retry = self.opts.retry.with_max_trials(max_trials);
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.opts.retry = self.opts.retry.with_retry_delay(retry_delay);
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectorOptions {
        self.opts
    }

    /// Open a `SQLite` connection with the accumulated options.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Open`] if the engine cannot open the database.
    pub fn open(self) -> Result<Connection<Sqlite3>, ConnectorError> {
        Connection::open_with(&self.finish())
    }
}
