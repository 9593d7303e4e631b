//! Writes into the records: enrollment, session setup and score entry.
//!
//! Score entry goes through an assignment's upload token. Locked sessions and
//! completed uploads refuse further scores.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Records;
use super::types::{
    ExamResult, ExamSession, Gender, SessionKey, Student, StudentStatus, Subject,
    SubjectAssignment, Teacher, validate_form,
};
use crate::error::ValidationError;
use crate::scope::Scope;

const ADMISSION_PREFIX: &str = "PAR";

/// One row of a teacher's completed score sheet. Other columns are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSheetRow {
    #[serde(rename = "Admission Number")]
    pub admission_number: String,
    #[serde(rename = "Full Name", default)]
    pub full_name: String,
    #[serde(rename = "Stream", default)]
    pub stream: String,
    #[serde(rename = "Gender", default)]
    pub gender: String,
    #[serde(rename = "Score", default)]
    pub score: String,
}

/// Parses a raw score cell. Blank means "not graded"; anything else must be a
/// finite number within 0..=100.
pub fn parse_score(raw: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let score: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NonNumericScore(trimmed.to_string()))?;
    if !score.is_finite() {
        return Err(ValidationError::NonNumericScore(trimmed.to_string()));
    }
    if !(0.0..=100.0).contains(&score) {
        return Err(ValidationError::ScoreOutOfRange(score));
    }
    Ok(Some(score))
}

impl Records {
    /// Next free admission number for the enrollment year, e.g. `PAR/2025/004`.
    pub fn next_admission_number(&self, year: i32) -> String {
        let enrolled = self
            .students
            .iter()
            .filter(|s| s.enrolled_on.year() == year)
            .count();
        let mut n = enrolled + 1;
        loop {
            let candidate = format!("{ADMISSION_PREFIX}/{year}/{n:03}");
            if self.student(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Enrolls a student, assigning an admission number, and returns it.
    #[allow(clippy::too_many_arguments)]
    pub fn enroll(
        &mut self,
        full_name: &str,
        gender: Gender,
        form: u8,
        stream: &str,
        parent_name: &str,
        parent_contact: &str,
        enrolled_on: NaiveDate,
    ) -> Result<String> {
        validate_form(form)?;
        let admission_number = self.next_admission_number(enrolled_on.year());

        self.students.push(Student {
            admission_number: admission_number.clone(),
            full_name: full_name.trim().to_string(),
            gender,
            form,
            stream: stream.trim().to_string(),
            parent_name: parent_name.trim().to_string(),
            parent_contact: parent_contact.trim().to_string(),
            status: StudentStatus::Active,
            enrolled_on,
        });
        debug!(admission_number = %admission_number, "Student enrolled");
        Ok(admission_number)
    }

    /// Marks a student transferred or completed. Results stay in the records.
    pub fn set_status(&mut self, admission_number: &str, status: StudentStatus) -> Result<()> {
        let student = self
            .students
            .iter_mut()
            .find(|s| s.admission_number == admission_number)
            .ok_or_else(|| ValidationError::UnknownStudent(admission_number.to_string()))?;
        student.status = status;
        Ok(())
    }

    pub fn add_subject(&mut self, code: &str, name: &str) -> Result<()> {
        if self.subjects.iter().any(|s| s.code == code) {
            return Err(ValidationError::Duplicate(format!("subject {code}")).into());
        }
        self.subjects.push(Subject {
            code: code.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn add_teacher(&mut self, full_name: &str, phone: &str, email: Option<&str>) -> u32 {
        let id = self.teachers.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.teachers.push(Teacher {
            id,
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            email: email.map(str::to_string),
        });
        id
    }

    /// Opens an exam session. Keys are unique.
    pub fn open_session(&mut self, key: SessionKey) -> Result<u32> {
        validate_form(key.form)?;
        if self.session_by_key(&key).is_some() {
            return Err(ValidationError::Duplicate(format!("exam session {key}")).into());
        }
        let id = self.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.sessions.push(ExamSession {
            id,
            form: key.form,
            stream: key.stream,
            term: key.term,
            year: key.year,
            is_locked: false,
        });
        Ok(id)
    }

    /// Locks a session against further score entry. Locking twice is harmless.
    /// The stream is matched without regard to case, as scopes are.
    pub fn lock_session(&mut self, key: &SessionKey) -> Result<()> {
        let scope = Scope::session(key);
        let session = self
            .sessions
            .iter_mut()
            .find(|s| scope.covers(s))
            .ok_or_else(|| ValidationError::UnknownSession(key.to_string()))?;
        session.is_locked = true;
        info!(session = %key, "Exam session locked");
        Ok(())
    }

    /// Binds a subject and teacher to a session and issues a fresh upload token.
    pub fn assign(
        &mut self,
        session_id: u32,
        subject_code: &str,
        teacher_id: u32,
        upload_deadline: NaiveDate,
    ) -> Result<&SubjectAssignment> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(ValidationError::UnknownSession(format!("id {session_id}")).into());
        }
        if !self.subjects.iter().any(|s| s.code == subject_code) {
            return Err(ValidationError::UnknownSubject(subject_code.to_string()).into());
        }
        if !self.teachers.iter().any(|t| t.id == teacher_id) {
            return Err(ValidationError::UnknownTeacher(teacher_id).into());
        }
        if self.assignments.iter().any(|a| {
            a.session_id == session_id && a.subject_code == subject_code && a.teacher_id == teacher_id
        }) {
            return Err(ValidationError::Duplicate(format!(
                "assignment of {subject_code} to teacher {teacher_id} in session {session_id}"
            ))
            .into());
        }

        let id = self.assignments.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        self.assignments.push(SubjectAssignment {
            id,
            session_id,
            subject_code: subject_code.to_string(),
            teacher_id,
            upload_deadline,
            is_uploaded: false,
            upload_token: Uuid::new_v4(),
        });
        Ok(&self.assignments[self.assignments.len() - 1])
    }

    pub fn assignment_by_token(&self, token: Uuid) -> Option<&SubjectAssignment> {
        self.assignments.iter().find(|a| a.upload_token == token)
    }

    /// Resolves a token to an assignment that still accepts scores.
    fn writable_assignment(&self, token: Uuid) -> Result<&SubjectAssignment> {
        let assignment = self
            .assignment_by_token(token)
            .ok_or(ValidationError::UnknownToken(token))?;
        if assignment.is_uploaded {
            return Err(ValidationError::TokenRedeemed(token).into());
        }
        let session = self
            .sessions
            .iter()
            .find(|s| s.id == assignment.session_id)
            .ok_or_else(|| {
                ValidationError::UnknownSession(format!("id {}", assignment.session_id))
            })?;
        if session.is_locked {
            return Err(ValidationError::SessionLocked(session.key().to_string()).into());
        }
        Ok(assignment)
    }

    /// Records (or replaces) one student's score for the token's assignment.
    pub fn record_score(&mut self, token: Uuid, admission_number: &str, raw: &str) -> Result<()> {
        let assignment_id = self.writable_assignment(token)?.id;
        if self.student(admission_number).is_none() {
            return Err(ValidationError::UnknownStudent(admission_number.to_string()).into());
        }
        let score = parse_score(raw)?;

        match self
            .results
            .iter_mut()
            .find(|r| r.admission_number == admission_number && r.assignment_id == assignment_id)
        {
            Some(existing) => existing.score = score,
            None => self.results.push(ExamResult {
                admission_number: admission_number.to_string(),
                assignment_id,
                score,
            }),
        }
        Ok(())
    }

    /// Marks the token's upload finished. The token accepts no more scores.
    pub fn complete_upload(&mut self, token: Uuid) -> Result<()> {
        self.writable_assignment(token)?;
        if let Some(a) = self.assignments.iter_mut().find(|a| a.upload_token == token) {
            a.is_uploaded = true;
        }
        Ok(())
    }

    /// Imports a completed score sheet. Rows are validated before any is
    /// written, so a bad sheet leaves the records untouched.
    pub fn import_score_sheet<R: Read>(&mut self, token: Uuid, reader: R) -> Result<usize> {
        self.writable_assignment(token)?;

        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let row: ScoreSheetRow = result?;
            if self.student(row.admission_number.trim()).is_none() {
                warn!(admission_number = %row.admission_number, "Score sheet row for unknown student");
                return Err(ValidationError::UnknownStudent(row.admission_number).into());
            }
            parse_score(&row.score)?;
            rows.push(row);
        }

        for row in &rows {
            self.record_score(token, row.admission_number.trim(), &row.score)?;
        }
        info!(token = %token, rows = rows.len(), "Score sheet imported");
        Ok(rows.len())
    }

    /// Blank score sheet rows for an assignment's stream, ordered by admission number.
    pub fn score_sheet_template(&self, token: Uuid) -> Result<Vec<ScoreSheetRow>> {
        let assignment = self
            .assignment_by_token(token)
            .ok_or(ValidationError::UnknownToken(token))?;
        let session = self
            .sessions
            .iter()
            .find(|s| s.id == assignment.session_id)
            .ok_or_else(|| {
                ValidationError::UnknownSession(format!("id {}", assignment.session_id))
            })?;

        let mut rows: Vec<ScoreSheetRow> = self
            .students
            .iter()
            .filter(|s| {
                s.form == session.form
                    && s.stream.eq_ignore_ascii_case(&session.stream)
                    && s.status == StudentStatus::Active
            })
            .map(|s| ScoreSheetRow {
                admission_number: s.admission_number.clone(),
                full_name: s.full_name.clone(),
                stream: s.stream.clone(),
                gender: s.gender.code().to_string(),
                score: String::new(),
            })
            .collect();
        rows.sort_by(|a, b| a.admission_number.cmp(&b.admission_number));
        Ok(rows)
    }
}
