//! School records and the read interfaces the aggregator needs from them.
//!
//! [`ResultStore`] yields per-subject scores for a student within a scope.
//! [`CohortDirectory`] yields the students compared within a scope.
//! [`Records`] implements both over a CSV snapshot on disk.

mod ingest;
mod snapshot;
pub mod types;

pub use ingest::{ScoreSheetRow, parse_score};
pub use snapshot::Records;

use anyhow::Result;

use crate::scope::Scope;
use types::Student;

/// Read access to exam results.
pub trait ResultStore {
    /// Subject codes examined in the scope, in a stable order. A subject with
    /// no assignment in any of the scope's sessions is not listed.
    fn subjects_examined(&self, scope: &Scope) -> Result<Vec<String>>;

    /// Scores recorded for one student within the scope.
    fn results_for(&self, admission_number: &str, scope: &Scope)
    -> Result<Vec<(String, Option<f64>)>>;

    /// Subject codes one student sat within the scope, in a stable order.
    /// Across streams this can be narrower than [`subjects_examined`].
    ///
    /// [`subjects_examined`]: ResultStore::subjects_examined
    fn subjects_taken(&self, _student: &Student, scope: &Scope) -> Result<Vec<String>> {
        self.subjects_examined(scope)
    }
}

/// Cohort membership.
pub trait CohortDirectory {
    /// Students compared within the scope, ordered by admission number.
    fn students_in(&self, scope: &Scope) -> Result<Vec<Student>>;
}
