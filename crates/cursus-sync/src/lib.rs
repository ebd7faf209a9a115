//! Reconciliation of the local academic-records store against ScoDoc.
//!
//! A run is two phases. A [`SourceAdapter`] reads the external source (a
//! directory of JSON exports, or the ScoDoc API) into a [`SyncBatch`]; the
//! orchestrator then applies that batch through a single store transaction:
//!
//! 1. seed the reference vocabulary,
//! 2. import departments,
//! 3. synthesize programs (from rules or from program titles),
//! 4. import competency frameworks,
//! 5. per source unit, import enrollments and then evaluations.
//!
//! Re-running on identical input writes nothing new.

#![allow(async_fn_in_trait)]

pub mod classify;
pub mod enrollments;
pub mod error;
pub mod evaluations;
pub mod pipeline;
pub mod programs;
pub mod reference;
pub mod resolver;
pub mod rules;
pub mod source;

pub use error::{Result, SyncError};
pub use pipeline::{SyncSettings, SyncStage, apply, run};
pub use rules::RuleSet;
pub use source::{FilesSource, ScoDocSource, SourceAdapter, SyncBatch};
