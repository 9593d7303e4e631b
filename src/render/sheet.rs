//! Tabular results sheet.
//!
//! Written as CSV sections: title, dashboard figures, subject performance and
//! the ranked results table. Rows follow the cohort's rank order.

use anyhow::Result;
use bytes::Bytes;
use csv::WriterBuilder;

use super::{Artifact, ReportHeader, file_stem};
use crate::aggregate::utility::format_score;
use crate::aggregate::{CohortSummary, RankedCohort};
use crate::grading::{Division, Grade};
use crate::records::ScoreSheetRow;

pub const CONTENT_TYPE: &str = "text/csv";

/// Fixed columns preceding the per-subject columns of the results table.
const LEADING_COLUMNS: [&str; 5] = ["Position", "Admission No", "Full Name", "Stream", "Gender"];

/// Fixed columns following the per-subject columns of the results table.
const TRAILING_COLUMNS: [&str; 7] = [
    "Total",
    "Mean",
    "Grade",
    "Remark",
    "Division",
    "Division Points",
    "Division Remark",
];

/// Renders the cohort's results sheet.
pub fn render_sheet(header: &ReportHeader, cohort: &RankedCohort) -> Result<Artifact> {
    let summary = CohortSummary::from_cohort(cohort);
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record([header.school_name.as_str()])?;
    writer.write_record([format!(
        "OFFICIAL EXAM RESULTS - {} {}",
        header.term, header.year
    )])?;
    writer.write_record([header.scope_label.as_str()])?;
    writer.write_record([""])?;

    writer.write_record(["GENERAL DETAILS"])?;
    writer.write_record(["School Name", header.school_name.as_str()])?;
    writer.write_record([
        "Exam Session".to_string(),
        format!("{} {}", header.term, header.year),
    ])?;
    writer.write_record(["Export Scope", header.scope_label.as_str()])?;
    writer.write_record([
        "Date Exported".to_string(),
        header.generated_on.format("%d %B %Y").to_string(),
    ])?;
    writer.write_record([""])?;

    writer.write_record(["SUMMARY STATS"])?;
    writer.write_record(["Total Students".to_string(), summary.total_students.to_string()])?;
    writer.write_record(["Average Mean".to_string(), format_score(summary.average_mean)])?;
    writer.write_record(["Highest Mean".to_string(), format_score(summary.highest_mean)])?;
    writer.write_record(["Lowest Mean".to_string(), format_score(summary.lowest_mean)])?;
    writer.write_record([""])?;

    writer.write_record(["DIVISION PERFORMANCE"])?;
    for division in Division::ALL {
        let count = summary.division_distribution.get(&division).copied().unwrap_or(0);
        writer.write_record([division.roman().to_string(), count.to_string()])?;
    }
    writer.write_record([""])?;

    writer.write_record(["GRADE DISTRIBUTION"])?;
    for grade in Grade::LETTERS.iter().chain(std::iter::once(&Grade::Missing)) {
        let count = summary.grade_distribution.get(grade).copied().unwrap_or(0);
        writer.write_record([grade.letter().to_string(), count.to_string()])?;
    }
    writer.write_record([""])?;

    writer.write_record(["GENDER & MISSING"])?;
    for (gender, count) in &summary.gender_distribution {
        writer.write_record([gender.clone(), count.to_string()])?;
    }
    writer.write_record(["Missing Results".to_string(), summary.missing_results.to_string()])?;
    writer.write_record([""])?;

    writer.write_record(["SUBJECT PERFORMANCE"])?;
    let mut performance_header = vec!["Subject".to_string(), "Total Students".to_string()];
    performance_header.extend(
        Grade::LETTERS
            .iter()
            .map(|g| format!("{} ({})", g.letter(), g.band())),
    );
    performance_header.push("Average NECTA Points".to_string());
    writer.write_record(&performance_header)?;
    for subject in &summary.subjects {
        let mut row = vec![subject.subject.clone(), subject.graded.to_string()];
        row.extend(subject.grade_counts.iter().map(|c| c.to_string()));
        row.push(subject.average_point.map(format_score).unwrap_or_default());
        writer.write_record(&row)?;
    }
    writer.write_record([summary.gpa_comment()])?;
    writer.write_record([""])?;

    writer.write_record(["RESULTS"])?;
    let mut columns: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(cohort.subjects.iter().cloned());
    columns.extend(TRAILING_COLUMNS.iter().map(|c| c.to_string()));
    writer.write_record(&columns)?;

    for (student, report) in &cohort.entries {
        let mut row = vec![
            report.rank.to_string(),
            student.admission_number.clone(),
            student.full_name.clone(),
            student.stream.clone(),
            student.gender.code().to_string(),
        ];
        row.extend(cohort.subjects.iter().map(|code| {
            report
                .line(code)
                .and_then(|l| l.score)
                .map(format_score)
                .unwrap_or_default()
        }));
        let mean_grade = report.mean_grade();
        row.push(format_score(report.total));
        row.push(format_score(report.mean));
        row.push(mean_grade.letter().to_string());
        row.push(mean_grade.remark().to_string());
        row.push(report.division.roman().to_string());
        row.push(if report.division == Division::NotApplicable {
            String::new()
        } else {
            report.best_seven_points.to_string()
        });
        row.push(report.division_remark().to_string());
        writer.write_record(&row)?;
    }
    writer.write_record([""])?;
    writer.write_record([format!(
        "Document generated automatically on {} by the Examination Management System.",
        header.generated_on.format("%d %B %Y")
    )])?;

    let body = writer.into_inner()?;
    Ok(Artifact {
        file_name: format!(
            "Full_Results_{}_{}_{}.csv",
            file_stem(&header.scope_label),
            file_stem(header.term.label()),
            header.year
        ),
        content_type: CONTENT_TYPE,
        body: Bytes::from(body),
    })
}

/// Renders a blank score sheet for a teacher to fill in and upload.
pub fn render_score_sheet(file_name: &str, rows: &[ScoreSheetRow]) -> Result<Artifact> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(["Admission Number", "Full Name", "Stream", "Gender", "Score"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let body = writer.into_inner()?;

    Ok(Artifact {
        file_name: file_name.to_string(),
        content_type: CONTENT_TYPE,
        body: Bytes::from(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{SubjectScores, tally};
    use crate::records::types::{Gender, Student, StudentStatus, Term};
    use crate::scope::Scope;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn header() -> ReportHeader {
        ReportHeader {
            school_name: "Paranga Secondary School".to_string(),
            school_contact: String::new(),
            term: Term::Annual,
            year: 2025,
            scope_label: "Form 2 A".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2025, 11, 28).unwrap(),
            subject_names: BTreeMap::new(),
        }
    }

    fn student(adm: &str, name: &str) -> Student {
        Student {
            admission_number: adm.to_string(),
            full_name: name.to_string(),
            gender: Gender::Male,
            form: 2,
            stream: "A".to_string(),
            parent_name: "P".to_string(),
            parent_contact: "0700000000".to_string(),
            status: StudentStatus::Active,
            enrolled_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn body(artifact: &Artifact) -> String {
        String::from_utf8(artifact.body.to_vec()).unwrap()
    }

    #[test]
    fn test_results_rows_follow_rank_order() {
        let subjects = vec!["ENG".to_string(), "MATH".to_string()];
        let top: SubjectScores = [("ENG".to_string(), Some(90.0)), ("MATH".to_string(), Some(80.0))]
            .into_iter()
            .collect();
        let mut first = tally("PAR/2025/002", &subjects, &top);
        first.rank = 1;
        first.cohort_size = 2;
        let mut second = tally("PAR/2025/001", &subjects, &SubjectScores::new());
        second.rank = 2;
        second.cohort_size = 2;

        let cohort = RankedCohort {
            scope: Scope::new(2, Some("A"), Term::Annual, 2025),
            subjects,
            entries: vec![
                (student("PAR/2025/002", "Baraka"), first),
                (student("PAR/2025/001", "Amani"), second),
            ],
        };
        let artifact = render_sheet(&header(), &cohort).unwrap();
        let text = body(&artifact);

        assert_eq!(artifact.file_name, "Full_Results_Form_2_A_Annual_2025.csv");
        assert!(text.contains(
            "Position,Admission No,Full Name,Stream,Gender,ENG,MATH,Total,Mean,Grade,Remark,Division,Division Points,Division Remark"
        ));
        assert!(text.contains("1,PAR/2025/002,Baraka,A,M,90,80,170,85,A,Excellent,N/A,,Insufficient Subjects"));
        assert!(text.contains("2,PAR/2025/001,Amani,A,M,,,0,0,–,No Score,N/A,,Insufficient Subjects"));
        let first_row = text.find("1,PAR/2025/002").unwrap();
        let second_row = text.find("2,PAR/2025/001").unwrap();
        assert!(first_row < second_row);
        assert!(text.contains("Date Exported,28 November 2025"));
    }

    #[test]
    fn test_subject_cells_follow_columns() {
        let subjects = vec!["ENG".to_string(), "MATH".to_string()];
        let scores: SubjectScores = [("MATH".to_string(), Some(60.0))].into_iter().collect();
        let mut report = tally("PAR/2025/003", &subjects[1..], &scores);
        report.rank = 1;
        report.cohort_size = 1;

        let cohort = RankedCohort {
            scope: Scope::new(2, None, Term::Annual, 2025),
            subjects,
            entries: vec![(student("PAR/2025/003", "Chausiku"), report)],
        };
        let text = body(&render_sheet(&header(), &cohort).unwrap());
        assert!(text.contains("1,PAR/2025/003,Chausiku,A,M,,60,60,60,C,"));
    }

    #[test]
    fn test_empty_cohort_still_renders() {
        let cohort = RankedCohort {
            scope: Scope::new(2, None, Term::Annual, 2025),
            subjects: vec![],
            entries: vec![],
        };
        let text = body(&render_sheet(&header(), &cohort).unwrap());
        assert!(text.contains("Total Students,0"));
        assert!(text.contains("RESULTS"));
    }

    #[test]
    fn test_blank_score_sheet_has_headers() {
        let artifact = render_score_sheet("MATH_Mid_Term_2025.csv", &[]).unwrap();
        assert_eq!(body(&artifact), "Admission Number,Full Name,Stream,Gender,Score\n");
    }
}
