//! Reference-data loader: rhythms, enrollment states and the decision seed.

use cursus_core::{
  reference::{DECISION_SEED, EnrollmentState, Rhythm},
  session::{SessionError, SyncSession},
  stats::SyncStats,
};
use strum::IntoEnumIterator as _;

/// Ensure the static vocabulary exists, counting the rows written.
pub fn seed<E: SessionError>(
  session: &mut dyn SyncSession<Error = E>,
  stats: &mut SyncStats,
) -> Result<(), E> {
  for rhythm in Rhythm::iter() {
    if session.ensure_rhythm(rhythm)? {
      stats.rhythms += 1;
    }
  }
  for state in EnrollmentState::iter() {
    if session.ensure_enrollment_state(state)? {
      stats.states += 1;
    }
  }
  for (name, acronym) in DECISION_SEED {
    if session.ensure_decision(name, acronym)?.inserted {
      stats.decisions += 1;
    }
  }
  Ok(())
}
