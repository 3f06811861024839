//! Synchronous `SQLite` command connector.
//!
//! Runs raw SQL text through `sqlite3_exec` and adds two things the C API does
//! not give you:
//!
//! - transparent retry while the database reports `SQLITE_BUSY`, bounded by a
//!   [`RetryPolicy`] (16 trials, 20µs apart by default);
//! - a row callback bridge: a Rust closure receives each result row, and an
//!   error or panic raised inside it is caught at the C boundary and reported
//!   on the calling thread once the engine has unwound.
//!
//! ```no_run
//! use sqlite_connector::{Connection, ConnectorError};
//!
//! # fn main() -> Result<(), ConnectorError> {
//! let mut conn = Connection::open("app.db")?;
//! conn.execute("CREATE TABLE IF NOT EXISTS t(x)")?;
//! conn.execute("INSERT INTO t VALUES (1)")?;
//! conn.execute_callback("SELECT x FROM t", |row| {
//!     println!("{:?}", row.get(0));
//!     Ok::<(), ConnectorError>(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod connector;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod row;

pub use config::{ConnectorOptions, ConnectorOptionsBuilder, RetryPolicy};
pub use connection::Connection;
pub use connector::SqlConnector;
pub use engine::{Engine, ExecCallback, Sqlite3};
pub use error::{ConnectorError, RowError};
pub use row::Row;
