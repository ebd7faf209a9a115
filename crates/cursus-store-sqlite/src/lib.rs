//! SQLite backend for the Cursus academic-records store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A pipeline run executes entirely
//! inside one [`tokio_rusqlite::Connection::call`], on one transaction.

mod encode;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use session::SqliteSession;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
