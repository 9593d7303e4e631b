use std::collections::BTreeMap;

use super::types::{CohortSummary, RankedCohort, SubjectSummary};
use super::utility::{mean, round2};
use crate::grading::Grade;

/// GPA the school compares itself against on the results sheet.
pub const BENCHMARK_GPA: f64 = 3.5;

impl CohortSummary {
    /// Summarises a ranked cohort. Every figure is read from the cohort's
    /// reports, so it grades exactly as the reports do.
    pub fn from_cohort(cohort: &RankedCohort) -> Self {
        let reports: Vec<_> = cohort.entries.iter().map(|(_, r)| r).collect();
        let means: Vec<f64> = reports.iter().map(|r| r.mean).collect();

        let mut grade_distribution = BTreeMap::new();
        let mut division_distribution = BTreeMap::new();
        let mut gender_distribution = BTreeMap::new();
        for (student, report) in &cohort.entries {
            *grade_distribution.entry(report.mean_grade()).or_insert(0) += 1;
            *division_distribution.entry(report.division).or_insert(0) += 1;
            *gender_distribution
                .entry(student.gender.code().to_string())
                .or_insert(0) += 1;
        }

        let missing_results = reports
            .iter()
            .filter(|r| r.examined < r.subjects.len())
            .count();

        let subjects = cohort
            .subjects
            .iter()
            .map(|code| {
                let lines: Vec<_> = reports
                    .iter()
                    .filter_map(|r| r.line(code))
                    .filter(|l| l.score.is_some())
                    .collect();

                let mut grade_counts = [0usize; 5];
                for line in &lines {
                    if let Some(slot) = Grade::LETTERS.iter().position(|g| *g == line.grade) {
                        grade_counts[slot] += 1;
                    }
                }

                let points: Vec<f64> = lines
                    .iter()
                    .filter_map(|l| l.point.map(f64::from))
                    .collect();

                SubjectSummary {
                    subject: code.clone(),
                    graded: lines.len(),
                    grade_counts,
                    average_point: if points.is_empty() {
                        None
                    } else {
                        Some(round2(mean(&points)))
                    },
                }
            })
            .collect();

        let student_points: Vec<f64> = reports.iter().filter_map(|r| r.mean_point()).collect();

        CohortSummary {
            total_students: reports.len(),
            average_mean: round2(mean(&means)),
            highest_mean: means.iter().copied().fold(None, max_of).unwrap_or(0.0),
            lowest_mean: means.iter().copied().fold(None, min_of).unwrap_or(0.0),
            grade_distribution,
            gender_distribution,
            division_distribution,
            missing_results,
            subjects,
            school_gpa: round2(mean(&student_points)),
        }
    }

    /// One-line verdict comparing the school GPA with [`BENCHMARK_GPA`].
    ///
    /// The GPA is a mean of NECTA points, where A is 1 and F is 5, so a GPA
    /// under the benchmark is the good side of it.
    pub fn gpa_comment(&self) -> String {
        let gpa = self.school_gpa;
        if gpa < BENCHMARK_GPA {
            format!("School GPA ({gpa}) is BETTER than benchmark ({BENCHMARK_GPA}) - Excellent")
        } else if gpa > BENCHMARK_GPA {
            format!("School GPA ({gpa}) is WORSE than benchmark ({BENCHMARK_GPA}) - Needs Improvement")
        } else {
            format!("School GPA ({gpa}) is equal to benchmark ({BENCHMARK_GPA})")
        }
    }
}

fn max_of(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

fn min_of(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}
