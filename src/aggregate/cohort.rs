use anyhow::Result;
use tracing::debug;

use super::types::{AggregatedReport, RankedCohort, SubjectLine, SubjectScores};
use super::utility::round2;
use crate::error::ValidationError;
use crate::grading::{BEST_OF, Grade, division};
use crate::records::{CohortDirectory, ResultStore};
use crate::scope::Scope;

/// Builds an unranked report from one student's scores.
///
/// Only `subjects` are reported, in that order; scores for anything else are
/// ignored. Missing scores are shown but excluded from totals, mean and the
/// best seven.
pub fn tally(admission_number: &str, subjects: &[String], scores: &SubjectScores) -> AggregatedReport {
    let lines: Vec<SubjectLine> = subjects
        .iter()
        .map(|code| {
            let score = scores.get(code).copied().flatten().filter(|s| !s.is_nan());
            let grade = Grade::from_score(score);
            SubjectLine {
                subject: code.clone(),
                score,
                grade,
                remark: grade.remark(),
                point: score.map(|_| grade.point()),
            }
        })
        .collect();

    let graded: Vec<f64> = lines.iter().filter_map(|l| l.score).collect();
    let examined = graded.len();
    let total = graded.iter().fold(0.0, |acc, s| acc + s);
    let mean = if examined == 0 {
        0.0
    } else {
        round2(total / examined as f64)
    };

    let mut points: Vec<u8> = lines.iter().filter_map(|l| l.point).collect();
    points.sort_unstable();
    let best_seven = &points[..points.len().min(BEST_OF)];
    let best_seven_points: u32 = best_seven.iter().map(|p| u32::from(*p)).sum();
    let best_seven_passes = best_seven.iter().filter(|p| **p <= Grade::D.point()).count();

    AggregatedReport {
        admission_number: admission_number.to_string(),
        subjects: lines,
        total,
        examined,
        mean,
        best_seven_points,
        best_seven_passes,
        division: division(best_seven_points, best_seven_passes, examined),
        rank: 0,
        cohort_size: 0,
    }
}

/// Folds result rows into one score per subject. When a subject has several
/// rows, a recorded score wins over a blank one and the first recorded score
/// is kept.
pub fn collate(rows: Vec<(String, Option<f64>)>) -> SubjectScores {
    let mut scores = SubjectScores::new();
    for (subject, score) in rows {
        let slot = scores.entry(subject).or_insert(None);
        if slot.is_none() {
            *slot = score;
        }
    }
    scores
}

/// Aggregates and ranks every student in the scope.
///
/// Each report lists only the subjects the student sat; the cohort's
/// `subjects` is the union used for table columns.
///
/// Ordering is total descending, then mean descending; ties keep the
/// directory's order (admission number). Ranks run 1..=N without gaps.
pub fn rank_cohort<S>(store: &S, scope: &Scope) -> Result<RankedCohort>
where
    S: ResultStore + CohortDirectory,
{
    let subjects = store.subjects_examined(scope)?;
    let students = store.students_in(scope)?;

    let mut entries = Vec::with_capacity(students.len());
    for student in students {
        let taken = store.subjects_taken(&student, scope)?;
        let scores = collate(store.results_for(&student.admission_number, scope)?);
        let report = tally(&student.admission_number, &taken, &scores);
        entries.push((student, report));
    }

    entries.sort_by(|(_, a), (_, b)| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| b.mean.total_cmp(&a.mean))
    });

    let cohort_size = entries.len();
    for (position, (_, report)) in entries.iter_mut().enumerate() {
        report.rank = position + 1;
        report.cohort_size = cohort_size;
    }

    debug!(scope = %scope, students = cohort_size, subjects = subjects.len(), "Cohort ranked");

    Ok(RankedCohort {
        scope: scope.clone(),
        subjects,
        entries,
    })
}

/// Builds one student's ranked report within the scope.
pub fn aggregate<S>(store: &S, admission_number: &str, scope: &Scope) -> Result<AggregatedReport>
where
    S: ResultStore + CohortDirectory,
{
    let cohort = rank_cohort(store, scope)?;
    cohort
        .find(admission_number)
        .map(|(_, report)| report.clone())
        .ok_or_else(|| {
            ValidationError::StudentNotInScope {
                admission_number: admission_number.to_string(),
                scope: scope.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::utility::format_score;
    use crate::grading::Division;

    fn subjects(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn scores(pairs: &[(&str, Option<f64>)]) -> SubjectScores {
        pairs.iter().map(|(c, s)| (c.to_string(), *s)).collect()
    }

    #[test]
    fn test_six_examined_is_insufficient() {
        let codes = subjects(&["MATH", "ENG", "KISW", "BIO", "CHEM", "PHY", "CIV"]);
        let report = tally(
            "PAR/2025/001",
            &codes,
            &scores(&[
                ("MATH", Some(80.0)),
                ("ENG", Some(70.0)),
                ("KISW", Some(50.0)),
                ("BIO", Some(40.0)),
                ("CHEM", Some(20.0)),
                ("PHY", Some(10.0)),
                ("CIV", None),
            ]),
        );

        let letters: Vec<&str> = report.subjects.iter().map(|l| l.grade.letter()).collect();
        assert_eq!(letters, vec!["A", "B", "C", "D", "F", "F", "–"]);
        let points: Vec<Option<u8>> = report.subjects.iter().map(|l| l.point).collect();
        assert_eq!(
            points,
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(5), None]
        );
        assert_eq!(report.examined, 6);
        assert_eq!(report.total, 270.0);
        assert_eq!(report.mean, 45.0);
        assert_eq!(report.best_seven_points, 20);
        assert_eq!(report.division, Division::NotApplicable);
    }

    #[test]
    fn test_best_seven_takes_lowest_points() {
        let codes = subjects(&["A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9"]);
        let report = tally(
            "x",
            &codes,
            &scores(&[
                ("A1", Some(80.0)),
                ("A2", Some(80.0)),
                ("A3", Some(70.0)),
                ("A4", Some(70.0)),
                ("A5", Some(50.0)),
                ("A6", Some(50.0)),
                ("A7", Some(40.0)),
                ("A8", Some(10.0)),
                ("A9", Some(5.0)),
            ]),
        );
        // 1 + 1 + 2 + 2 + 3 + 3 + 4
        assert_eq!(report.best_seven_points, 16);
        assert_eq!(report.best_seven_passes, 7);
        assert_eq!(report.division, Division::I);
    }

    #[test]
    fn test_failing_seven_is_division_zero() {
        let codes = subjects(&["A1", "A2", "A3", "A4", "A5", "A6", "A7"]);
        let pairs: Vec<(&str, Option<f64>)> = codes.iter().map(|c| (c.as_str(), Some(12.0))).collect();
        let report = tally("x", &codes, &scores(&pairs));
        assert_eq!(report.best_seven_points, 35);
        assert_eq!(report.best_seven_passes, 0);
        assert_eq!(report.division, Division::Zero);
    }

    #[test]
    fn test_no_results_is_well_formed() {
        let codes = subjects(&["MATH", "ENG"]);
        let report = tally("x", &codes, &SubjectScores::new());
        assert_eq!(report.total, 0.0);
        assert_eq!(report.mean, 0.0);
        assert_eq!(report.examined, 0);
        assert_eq!(report.division, Division::NotApplicable);
        assert_eq!(report.mean_grade(), Grade::Missing);
        assert_eq!(report.subjects.len(), 2);
        assert!(report.total.is_sign_positive());
        assert_eq!(format_score(report.total), "0");
    }

    #[test]
    fn test_collate_keeps_recorded_score() {
        let rows = vec![
            ("MATH".to_string(), Some(88.0)),
            ("ENG".to_string(), None),
            ("MATH".to_string(), None),
            ("ENG".to_string(), Some(54.0)),
            ("ENG".to_string(), Some(61.0)),
        ];
        let scores = collate(rows);
        assert_eq!(scores.get("MATH"), Some(&Some(88.0)));
        assert_eq!(scores.get("ENG"), Some(&Some(54.0)));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_unexamined_subjects_are_ignored() {
        let codes = subjects(&["MATH"]);
        let report = tally("x", &codes, &scores(&[("MATH", Some(60.0)), ("GEO", Some(90.0))]));
        assert_eq!(report.subjects.len(), 1);
        assert_eq!(report.total, 60.0);
    }

    #[test]
    fn test_mean_is_rounded() {
        let codes = subjects(&["A", "B", "C"]);
        let report = tally(
            "x",
            &codes,
            &scores(&[("A", Some(70.0)), ("B", Some(65.0)), ("C", Some(65.0))]),
        );
        assert_eq!(report.mean, 66.67);
    }
}
