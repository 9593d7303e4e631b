//! Printable report cards, one page per student.
//!
//! Pages are plain text separated by form feeds, laid out for fixed-width
//! printing. Output depends only on the cohort and header, so regenerating
//! from unchanged results gives identical bytes.

use anyhow::Result;
use bytes::Bytes;
use std::fmt::Write as _;

use super::{Artifact, ReportHeader, file_stem};
use crate::aggregate::utility::format_score;
use crate::aggregate::{AggregatedReport, RankedCohort};
use crate::grading::Division;
use crate::records::types::Student;

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

pub const PAGE_BREAK: char = '\u{0c}';

const PAGE_WIDTH: usize = 78;

const CONDUCT_TRAITS: [&str; 5] = [
    "Uhudhuriaji",
    "Nidhamu",
    "Uongozi",
    "Ushirikiano",
    "Uwajibikaji",
];

const SIGNATURES: [&str; 3] = [
    "Sahihi ya Mwalimu wa Darasa:",
    "Sahihi ya Mwalimu wa Taaluma:",
    "Sahihi ya Mkuu wa Shule:",
];

const BLANK_LINE: &str = "_________________________";

/// Renders report cards for every student in rank order.
pub fn render_report_cards(header: &ReportHeader, cohort: &RankedCohort) -> Result<Artifact> {
    let pages: Vec<String> = cohort
        .entries
        .iter()
        .map(|(student, report)| render_page(header, student, report))
        .collect::<Result<_>>()?;

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            text.push(PAGE_BREAK);
        }
        text.push_str(page);
    }

    Ok(Artifact {
        file_name: format!(
            "Matokeo_{}_{}_{}.txt",
            file_stem(&header.scope_label),
            file_stem(header.term.label()),
            header.year
        ),
        content_type: CONTENT_TYPE,
        body: Bytes::from(text),
    })
}

fn centered(text: &str) -> String {
    let width = text.chars().count();
    if width >= PAGE_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((PAGE_WIDTH - width) / 2), text)
}

/// One student's page.
pub fn render_page(header: &ReportHeader, student: &Student, report: &AggregatedReport) -> Result<String> {
    let mut page = String::new();
    let term = header.term.swahili();

    writeln!(page, "{}", centered(&header.school_name.to_uppercase()))?;
    writeln!(page, "{}", centered(&format!("Matokeo ya Mwanafunzi ({term} {})", header.year)))?;
    writeln!(page, "{:>width$}", format!("Imetengenezwa: {}", header.generated_on), width = PAGE_WIDTH)?;
    writeln!(page)?;

    writeln!(page, "{:<20}{}", "Jina:", student.full_name)?;
    writeln!(page, "{:<20}{}", "Namba ya Usajili:", student.admission_number)?;
    writeln!(page, "{:<20}{} - {}", "Kidato & Mkondo:", student.form, student.stream)?;
    writeln!(page, "{:<20}{} - {}", "Muda & Mwaka:", term, header.year)?;
    writeln!(page, "{:<20}{} / {}", "Nafasi Darasani:", report.rank, report.cohort_size)?;
    writeln!(page)?;

    writeln!(page, "{:<24}{:>8}{:>8}{:>8}  {}", "Somo", "Alama", "Daraja", "Pointi", "Maoni")?;
    writeln!(page, "{}", "-".repeat(PAGE_WIDTH))?;
    for line in &report.subjects {
        writeln!(
            page,
            "{:<24}{:>8}{:>8}{:>8}  {}",
            header.subject_name(&line.subject),
            line.score.map_or_else(|| "-".to_string(), format_score),
            line.grade.letter(),
            line.point.map_or_else(|| "-".to_string(), |p| p.to_string()),
            line.grade.swahili_remark()
        )?;
    }
    writeln!(page, "{}", "-".repeat(PAGE_WIDTH))?;
    writeln!(page)?;

    writeln!(
        page,
        "Jumla ya Pointi (Masomo 7 Bora): {}     Wastani: {}     Daraja: {}",
        report.best_seven_points,
        format_score(report.mean),
        report.division
    )?;
    if report.division == Division::NotApplicable {
        writeln!(page, "(Masomo yaliyofanyika ni {}, hayatoshi kupata daraja.)", report.examined)?;
    }
    writeln!(page)?;

    writeln!(page, "{:<30}{}", "Tabia / Ujuzi", "Maoni")?;
    for t in CONDUCT_TRAITS {
        writeln!(page, "{:<30}{}", t, BLANK_LINE)?;
    }
    writeln!(page)?;

    writeln!(
        page,
        "Tarehe ya Kufunga Shule: {BLANK_LINE}     Tarehe ya Kufungua Shule: {BLANK_LINE}"
    )?;
    writeln!(page)?;
    writeln!(page, "Saini")?;
    for s in SIGNATURES {
        writeln!(page, "{:<32}{}", s, BLANK_LINE)?;
    }
    writeln!(page)?;

    if !header.school_contact.is_empty() {
        writeln!(page, "{}", centered(&header.school_contact))?;
    }
    writeln!(
        page,
        "{}",
        centered("Karatasi hii ya matokeo ni hati rasmi ya shule.")
    )?;

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{SubjectScores, tally};
    use crate::records::types::{Gender, StudentStatus, Term};
    use crate::scope::Scope;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn header() -> ReportHeader {
        ReportHeader {
            school_name: "Paranga Secondary School".to_string(),
            school_contact: "Simu: +255 675 000 000".to_string(),
            term: Term::MidTerm,
            year: 2025,
            scope_label: "Form 1 B".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            subject_names: [("MATH".to_string(), "Mathematics".to_string())]
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn student(adm: &str) -> Student {
        Student {
            admission_number: adm.to_string(),
            full_name: format!("Student {adm}"),
            gender: Gender::Female,
            form: 1,
            stream: "B".to_string(),
            parent_name: "P".to_string(),
            parent_contact: "0700000000".to_string(),
            status: StudentStatus::Active,
            enrolled_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn cohort() -> RankedCohort {
        let subjects = vec!["CIV".to_string(), "MATH".to_string()];
        let scores: SubjectScores = [("MATH".to_string(), Some(81.0))].into_iter().collect();
        let mut a = tally("PAR/2025/001", &subjects, &scores);
        a.rank = 1;
        a.cohort_size = 2;
        let mut b = tally("PAR/2025/002", &subjects, &SubjectScores::new());
        b.rank = 2;
        b.cohort_size = 2;
        RankedCohort {
            scope: Scope::new(1, Some("B"), Term::MidTerm, 2025),
            subjects,
            entries: vec![(student("PAR/2025/001"), a), (student("PAR/2025/002"), b)],
        }
    }

    #[test]
    fn test_one_page_per_student() {
        let artifact = render_report_cards(&header(), &cohort()).unwrap();
        let text = String::from_utf8(artifact.body.to_vec()).unwrap();
        let pages: Vec<&str> = text.split(PAGE_BREAK).collect();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Student PAR/2025/001"));
        assert!(pages[1].contains("Student PAR/2025/002"));
        assert_eq!(artifact.file_name, "Matokeo_Form_1_B_Mid_Term_2025.txt");
    }

    #[test]
    fn test_page_lists_grades_and_summary() {
        let c = cohort();
        let (student, report) = &c.entries[0];
        let page = render_page(&header(), student, report).unwrap();

        assert!(page.contains("Mathematics"));
        assert!(page.contains("Vizuri Sana"));
        assert!(page.contains("Nafasi Darasani:    1 / 2"));
        assert!(page.contains("Jumla ya Pointi (Masomo 7 Bora): 1     Wastani: 81     Daraja: N/A"));
        assert!(page.contains("Sahihi ya Mkuu wa Shule:"));
        assert!(page.contains("Mtihani wa Kati"));
    }

    #[test]
    fn test_regeneration_is_stable() {
        let first = render_report_cards(&header(), &cohort()).unwrap();
        let second = render_report_cards(&header(), &cohort()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_cohort_renders_empty_document() {
        let empty = RankedCohort {
            scope: Scope::new(1, None, Term::MidTerm, 2025),
            subjects: vec![],
            entries: vec![],
        };
        let artifact = render_report_cards(&header(), &empty).unwrap();
        assert!(artifact.body.is_empty());
    }
}
