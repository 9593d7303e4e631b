//! Result aggregation and cohort ranking.
//!
//! This module turns raw per-subject scores into [`AggregatedReport`]s:
//! grades and points per subject, total, mean, best-seven points, division
//! and rank within the cohort. Cohort-wide statistics for the results sheet
//! are derived from the same reports.

pub mod cohort;
pub mod stats;
pub mod types;
pub mod utility;

pub use cohort::{aggregate, rank_cohort, tally};
pub use types::{AggregatedReport, CohortSummary, RankedCohort, SubjectLine, SubjectScores, SubjectSummary};
