//! Durable school records as they are stored on disk.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Transferred,
    Completed,
}

/// A single row of `students.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub admission_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub form: u8,
    pub stream: String,
    pub parent_name: String,
    pub parent_contact: String,
    pub status: StudentStatus,
    pub enrolled_on: NaiveDate,
}

/// A single row of `teachers.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: u32,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// A single row of `subjects.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "Mid Term")]
    MidTerm,
    #[serde(rename = "Terminal")]
    Terminal,
    #[serde(rename = "Annual")]
    Annual,
    #[serde(rename = "Monthly Test")]
    MonthlyTest,
    #[serde(rename = "Proficiency Test")]
    ProficiencyTest,
}

impl Term {
    pub fn label(&self) -> &'static str {
        match self {
            Term::MidTerm => "Mid Term",
            Term::Terminal => "Terminal",
            Term::Annual => "Annual",
            Term::MonthlyTest => "Monthly Test",
            Term::ProficiencyTest => "Proficiency Test",
        }
    }

    /// Name printed on Swahili report cards and parent messages.
    pub fn swahili(&self) -> &'static str {
        match self {
            Term::MidTerm => "Mtihani wa Kati",
            Term::Annual => "Mtihani wa Mwisho wa Mwaka",
            other => other.label(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Term {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "midterm" => Ok(Term::MidTerm),
            "terminal" => Ok(Term::Terminal),
            "annual" => Ok(Term::Annual),
            "monthlytest" | "monthly" => Ok(Term::MonthlyTest),
            "proficiencytest" | "proficiency" => Ok(Term::ProficiencyTest),
            _ => Err(ValidationError::UnknownTerm(s.to_string())),
        }
    }
}

/// Swahili name of a form ("Kidato cha Kwanza" for form 1).
pub fn form_to_swahili(form: u8) -> String {
    match form {
        1 => "Kidato cha Kwanza".to_string(),
        2 => "Kidato cha Pili".to_string(),
        3 => "Kidato cha Tatu".to_string(),
        4 => "Kidato cha Nne".to_string(),
        other => format!("Form {other}"),
    }
}

pub fn validate_form(form: u8) -> Result<u8, ValidationError> {
    if (1..=4).contains(&form) {
        Ok(form)
    } else {
        Err(ValidationError::InvalidForm(form))
    }
}

/// Identity of an exam session. Unique across the records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub form: u8,
    pub stream: String,
    pub term: Term,
    pub year: u16,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Form {} {} - {} {}",
            self.form, self.stream, self.term, self.year
        )
    }
}

/// A single row of `sessions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: u32,
    pub form: u8,
    pub stream: String,
    pub term: Term,
    pub year: u16,
    pub is_locked: bool,
}

impl ExamSession {
    pub fn key(&self) -> SessionKey {
        SessionKey {
            form: self.form,
            stream: self.stream.clone(),
            term: self.term,
            year: self.year,
        }
    }
}

/// A single row of `assignments.csv`: one subject taught by one teacher in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAssignment {
    pub id: u32,
    pub session_id: u32,
    pub subject_code: String,
    pub teacher_id: u32,
    pub upload_deadline: NaiveDate,
    pub is_uploaded: bool,
    pub upload_token: Uuid,
}

/// A single row of `results.csv`. An empty score means "not yet graded".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub admission_number: String,
    pub assignment_id: u32,
    pub score: Option<f64>,
}
