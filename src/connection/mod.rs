mod callback;
mod execute;
mod handle;
mod retry;

pub use handle::Connection;
