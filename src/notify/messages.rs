use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use super::dispatch::Outgoing;
use super::phone::normalize_number;
use crate::aggregate::RankedCohort;
use crate::records::types::{Student, StudentStatus, Teacher};
use crate::render::ReportHeader;
use crate::render::sms::{announcement_message, result_message, split_message};

/// Who receives an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Teachers,
    Parents,
    All,
}

impl Audience {
    fn includes_teachers(&self) -> bool {
        matches!(self, Audience::Teachers | Audience::All)
    }

    fn includes_parents(&self) -> bool {
        matches!(self, Audience::Parents | Audience::All)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    pub target: Audience,
}

fn usable_number(recipient: &str, raw: &str) -> Option<String> {
    match normalize_number(raw) {
        Ok(number) => Some(number),
        Err(e) => {
            warn!(recipient, error = %e, "Unusable phone number");
            None
        }
    }
}

/// Idempotency token for a student's result message. The student fixes the
/// form, so term and year identify the exam.
pub fn result_token(header: &ReportHeader, admission_number: &str) -> String {
    format!(
        "results:{}:{}:{}",
        header.year,
        header.term.label(),
        admission_number
    )
}

/// One result message per ranked student, addressed to the parent.
///
/// Students with no recorded score in the scope get no message.
pub fn result_messages(cohort: &RankedCohort, header: &ReportHeader) -> Vec<Outgoing> {
    cohort
        .entries
        .iter()
        .filter(|(_, report)| report.examined > 0)
        .map(|(student, report)| Outgoing {
            token: result_token(header, &student.admission_number),
            recipient: student.full_name.clone(),
            number: usable_number(&student.full_name, &student.parent_contact),
            chunks: split_message(&result_message(student, report, header)),
        })
        .collect()
}

/// Announcement messages for the target audience.
///
/// Teachers sharing a number receive it once. Each active student's parent
/// gets a copy naming that child.
pub fn announcement_messages(
    announcement: &Announcement,
    teachers: &[Teacher],
    students: &[Student],
) -> Vec<Outgoing> {
    let mut out = Vec::new();

    if announcement.target.includes_teachers() {
        let text = announcement_message(&announcement.title, &announcement.message, None);
        let mut seen = HashSet::new();
        for teacher in teachers {
            let number = usable_number(&teacher.full_name, &teacher.phone);
            if let Some(n) = &number {
                if !seen.insert(n.clone()) {
                    continue;
                }
            }
            let key = number.clone().unwrap_or_else(|| format!("teacher-{}", teacher.id));
            out.push(Outgoing {
                token: format!("announcement:{}:{}", announcement.id, key),
                recipient: teacher.full_name.clone(),
                number,
                chunks: split_message(&text),
            });
        }
    }

    if announcement.target.includes_parents() {
        for student in students.iter().filter(|s| s.status == StudentStatus::Active) {
            let text = announcement_message(&announcement.title, &announcement.message, Some(student));
            out.push(Outgoing {
                token: format!("announcement:{}:{}", announcement.id, student.admission_number),
                recipient: format!("Mzazi wa {}", student.full_name),
                number: usable_number(&student.full_name, &student.parent_contact),
                chunks: split_message(&text),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{SubjectScores, tally};
    use crate::records::types::{Gender, Term};
    use crate::scope::Scope;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn student(adm: &str, contact: &str, status: StudentStatus) -> Student {
        Student {
            admission_number: adm.to_string(),
            full_name: format!("Mwanafunzi {adm}"),
            gender: Gender::Male,
            form: 3,
            stream: "A".to_string(),
            parent_name: "Mzazi".to_string(),
            parent_contact: contact.to_string(),
            status,
            enrolled_on: NaiveDate::from_ymd_opt(2023, 1, 9).unwrap(),
        }
    }

    fn teacher(id: u32, phone: &str) -> Teacher {
        Teacher {
            id,
            full_name: format!("Mwalimu {id}"),
            phone: phone.to_string(),
            email: None,
        }
    }

    fn header() -> ReportHeader {
        ReportHeader {
            school_name: "Paranga Secondary School".to_string(),
            school_contact: String::new(),
            term: Term::Terminal,
            year: 2025,
            scope_label: "Form 3 A".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            subject_names: BTreeMap::new(),
        }
    }

    #[test]
    fn test_result_messages_skip_students_without_scores() {
        let subjects = vec!["MATH".to_string()];
        let scored: SubjectScores = [("MATH".to_string(), Some(50.0))].into_iter().collect();
        let cohort = RankedCohort {
            scope: Scope::new(3, Some("A"), Term::Terminal, 2025),
            subjects: subjects.clone(),
            entries: vec![
                (
                    student("PAR/2023/001", "0712345678", StudentStatus::Active),
                    tally("PAR/2023/001", &subjects, &scored),
                ),
                (
                    student("PAR/2023/002", "0712345679", StudentStatus::Active),
                    tally("PAR/2023/002", &subjects, &SubjectScores::new()),
                ),
            ],
        };

        let messages = result_messages(&cohort, &header());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].token, "results:2025:Terminal:PAR/2023/001");
        assert_eq!(messages[0].number.as_deref(), Some("+255712345678"));
        assert!(messages[0].chunks[0].starts_with("Matokeo ya Mwanafunzi PAR/2023/001"));
    }

    #[test]
    fn test_announcement_dedupes_teacher_numbers() {
        let announcement = Announcement {
            id: "7".to_string(),
            title: "Kikao".to_string(),
            message: "Kikao cha walimu saa nane.".to_string(),
            target: Audience::Teachers,
        };
        let teachers = vec![
            teacher(1, "0712345678"),
            teacher(2, "+255712345678"),
            teacher(3, "none"),
        ];
        let messages = announcement_messages(&announcement, &teachers, &[]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].token, "announcement:7:+255712345678");
        assert_eq!(messages[1].number, None);
    }

    #[test]
    fn test_announcement_to_parents_names_child() {
        let announcement = Announcement {
            id: "8".to_string(),
            title: "Mkutano".to_string(),
            message: "Karibuni.".to_string(),
            target: Audience::Parents,
        };
        let students = vec![
            student("PAR/2023/001", "0712345678", StudentStatus::Active),
            student("PAR/2023/002", "0712345679", StudentStatus::Completed),
        ];
        let messages = announcement_messages(&announcement, &[teacher(1, "0700000000")], &students);

        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].chunks,
            vec!["Mzazi wa Mwanafunzi PAR/2023/001 (Kidato cha Tatu), Mkutano: Karibuni.".to_string()]
        );
    }
}
