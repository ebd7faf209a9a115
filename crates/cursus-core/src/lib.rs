//! Core types and trait definitions for the Cursus academic-records store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! reconciliation pipeline (`cursus-sync`) is written against the traits in
//! [`session`] and [`store`]; storage backends implement them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod competency;
pub mod department;
pub mod enrollment;
pub mod error;
pub mod ids;
pub mod program;
pub mod reference;
pub mod session;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
