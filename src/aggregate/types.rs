//! Data types produced by the aggregation pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::grading::{Division, Grade};
use crate::records::types::Student;
use crate::scope::Scope;

/// Typed score mapping for one student: subject code to score, `None` when not graded.
pub type SubjectScores = BTreeMap<String, Option<f64>>;

/// One subject row of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectLine {
    pub subject: String,
    pub score: Option<f64>,
    pub grade: Grade,
    pub remark: &'static str,
    /// `None` when the subject has no score; such subjects never enter the best seven.
    pub point: Option<u8>,
}

/// Everything reported about one student within one scope.
///
/// Recomputed from exam results on every call and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReport {
    pub admission_number: String,
    pub subjects: Vec<SubjectLine>,
    pub total: f64,
    /// Number of subjects with a score.
    pub examined: usize,
    pub mean: f64,
    pub best_seven_points: u32,
    /// Passed subjects among the best seven.
    pub best_seven_passes: usize,
    pub division: Division,
    /// 1-based position within the cohort.
    pub rank: usize,
    pub cohort_size: usize,
}

impl AggregatedReport {
    /// Grade of the mean score, shown in the sheet's Grade column.
    pub fn mean_grade(&self) -> Grade {
        if self.examined == 0 {
            Grade::Missing
        } else {
            Grade::from_score(Some(self.mean))
        }
    }

    /// The line for one subject, `None` when the student did not sit it.
    pub fn line(&self, subject: &str) -> Option<&SubjectLine> {
        self.subjects.iter().find(|l| l.subject == subject)
    }

    pub fn division_remark(&self) -> &'static str {
        self.division.remark()
    }

    /// Mean NECTA point over graded subjects, `None` when nothing was graded.
    pub fn mean_point(&self) -> Option<f64> {
        let points: Vec<f64> = self
            .subjects
            .iter()
            .filter_map(|l| l.point.map(f64::from))
            .collect();
        if points.is_empty() {
            None
        } else {
            Some(super::utility::mean(&points))
        }
    }
}

/// A cohort in rank order, with the subjects it was examined in.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCohort {
    pub scope: Scope,
    pub subjects: Vec<String>,
    pub entries: Vec<(Student, AggregatedReport)>,
}

impl RankedCohort {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, admission_number: &str) -> Option<&(Student, AggregatedReport)> {
        self.entries
            .iter()
            .find(|(s, _)| s.admission_number == admission_number)
    }
}

/// Per-subject performance across a cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub subject: String,
    /// Students with a score in this subject.
    pub graded: usize,
    /// Counts for A, B, C, D, F in that order.
    pub grade_counts: [usize; 5],
    pub average_point: Option<f64>,
}

/// Cohort-wide statistics printed on the results sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub total_students: usize,
    pub average_mean: f64,
    pub highest_mean: f64,
    pub lowest_mean: f64,
    pub grade_distribution: BTreeMap<Grade, usize>,
    pub gender_distribution: BTreeMap<String, usize>,
    pub division_distribution: BTreeMap<Division, usize>,
    /// Students missing a score in at least one examined subject.
    pub missing_results: usize,
    pub subjects: Vec<SubjectSummary>,
    pub school_gpa: f64,
}
