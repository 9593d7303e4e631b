use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

use super::types::{
    ExamResult, ExamSession, SessionKey, Student, StudentStatus, Subject, SubjectAssignment,
    Teacher,
};
use super::{CohortDirectory, ResultStore};
use crate::error::ValidationError;
use crate::scope::Scope;

const STUDENTS_CSV: &str = "students.csv";
const TEACHERS_CSV: &str = "teachers.csv";
const SUBJECTS_CSV: &str = "subjects.csv";
const SESSIONS_CSV: &str = "sessions.csv";
const ASSIGNMENTS_CSV: &str = "assignments.csv";
const RESULTS_CSV: &str = "results.csv";

/// A consistent snapshot of the school's records.
///
/// Aggregation only reads from it; writes go through the ingestion methods and
/// must be saved before another process aggregates.
#[derive(Debug, Clone, Default)]
pub struct Records {
    pub(super) students: Vec<Student>,
    pub(super) teachers: Vec<Teacher>,
    pub(super) subjects: Vec<Subject>,
    pub(super) sessions: Vec<ExamSession>,
    pub(super) assignments: Vec<SubjectAssignment>,
    pub(super) results: Vec<ExamResult>,
}

impl Records {
    /// Loads every CSV table from `dir`. A missing table is treated as empty.
    pub fn load(dir: &Path) -> Result<Self> {
        let records = Self {
            students: load_rows(&dir.join(STUDENTS_CSV))?,
            teachers: load_rows(&dir.join(TEACHERS_CSV))?,
            subjects: load_rows(&dir.join(SUBJECTS_CSV))?,
            sessions: load_rows(&dir.join(SESSIONS_CSV))?,
            assignments: load_rows(&dir.join(ASSIGNMENTS_CSV))?,
            results: load_rows(&dir.join(RESULTS_CSV))?,
        };
        records.check_uniqueness()?;

        info!(
            dir = %dir.display(),
            students = records.students.len(),
            sessions = records.sessions.len(),
            results = records.results.len(),
            "Records loaded"
        );
        Ok(records)
    }

    /// Writes every table back to `dir`, replacing existing files.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        save_rows(&dir.join(STUDENTS_CSV), &self.students)?;
        save_rows(&dir.join(TEACHERS_CSV), &self.teachers)?;
        save_rows(&dir.join(SUBJECTS_CSV), &self.subjects)?;
        save_rows(&dir.join(SESSIONS_CSV), &self.sessions)?;
        save_rows(&dir.join(ASSIGNMENTS_CSV), &self.assignments)?;
        save_rows(&dir.join(RESULTS_CSV), &self.results)?;
        debug!(dir = %dir.display(), "Records saved");
        Ok(())
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn sessions(&self) -> &[ExamSession] {
        &self.sessions
    }

    pub fn assignments(&self) -> &[SubjectAssignment] {
        &self.assignments
    }

    pub fn results(&self) -> &[ExamResult] {
        &self.results
    }

    pub fn student(&self, admission_number: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.admission_number == admission_number)
    }

    pub fn subject_name(&self, code: &str) -> Option<&str> {
        self.subjects
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.name.as_str())
    }

    pub fn session_by_key(&self, key: &SessionKey) -> Option<&ExamSession> {
        let scope = Scope::session(key);
        self.sessions.iter().find(|s| scope.covers(s))
    }

    /// Sessions belonging to the scope. A session scope must name an existing session;
    /// a form scope with no sessions is simply empty.
    pub fn sessions_in(&self, scope: &Scope) -> Result<Vec<&ExamSession>> {
        scope.validate()?;
        let sessions: Vec<&ExamSession> =
            self.sessions.iter().filter(|s| scope.covers(s)).collect();

        if sessions.is_empty() && matches!(scope, Scope::Session { .. }) {
            return Err(ValidationError::UnknownSession(scope.to_string()).into());
        }
        Ok(sessions)
    }

    fn assignments_in(&self, scope: &Scope) -> Result<Vec<&SubjectAssignment>> {
        let session_ids: HashSet<u32> = self.sessions_in(scope)?.iter().map(|s| s.id).collect();
        Ok(self
            .assignments
            .iter()
            .filter(|a| session_ids.contains(&a.session_id))
            .collect())
    }

    fn check_uniqueness(&self) -> Result<()> {
        let mut admissions = HashSet::new();
        for s in &self.students {
            if !admissions.insert(s.admission_number.as_str()) {
                return Err(duplicate(format!("student {}", s.admission_number)));
            }
        }

        let mut keys = HashSet::new();
        for s in &self.sessions {
            if !keys.insert(s.key()) {
                return Err(duplicate(format!("exam session {}", s.key())));
            }
        }

        let mut triples = HashSet::new();
        for a in &self.assignments {
            if !triples.insert((a.session_id, a.subject_code.as_str(), a.teacher_id)) {
                return Err(duplicate(format!(
                    "assignment of {} to teacher {} in session {}",
                    a.subject_code, a.teacher_id, a.session_id
                )));
            }
        }

        let mut pairs = HashSet::new();
        for r in &self.results {
            if !pairs.insert((r.admission_number.as_str(), r.assignment_id)) {
                return Err(duplicate(format!(
                    "result for {} in assignment {}",
                    r.admission_number, r.assignment_id
                )));
            }
        }
        Ok(())
    }
}

fn duplicate(what: String) -> anyhow::Error {
    ValidationError::Duplicate(what).into()
}

impl ResultStore for Records {
    fn subjects_examined(&self, scope: &Scope) -> Result<Vec<String>> {
        let mut codes: Vec<String> = self
            .assignments_in(scope)?
            .into_iter()
            .map(|a| a.subject_code.clone())
            .collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }

    fn results_for(
        &self,
        admission_number: &str,
        scope: &Scope,
    ) -> Result<Vec<(String, Option<f64>)>> {
        let assignments = self.assignments_in(scope)?;

        Ok(self
            .results
            .iter()
            .filter(|r| r.admission_number == admission_number)
            .filter_map(|r| {
                assignments
                    .iter()
                    .find(|a| a.id == r.assignment_id)
                    .map(|a| (a.subject_code.clone(), r.score))
            })
            .collect())
    }

    fn subjects_taken(&self, student: &Student, scope: &Scope) -> Result<Vec<String>> {
        let own_sessions: HashSet<u32> = self
            .sessions_in(scope)?
            .into_iter()
            .filter(|s| s.form == student.form && s.stream.eq_ignore_ascii_case(&student.stream))
            .map(|s| s.id)
            .collect();

        let mut codes: Vec<String> = self
            .assignments
            .iter()
            .filter(|a| own_sessions.contains(&a.session_id))
            .map(|a| a.subject_code.clone())
            .chain(
                self.results_for(&student.admission_number, scope)?
                    .into_iter()
                    .map(|(code, _)| code),
            )
            .collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }
}

impl CohortDirectory for Records {
    fn students_in(&self, scope: &Scope) -> Result<Vec<Student>> {
        let assignments = self.assignments_in(scope)?;
        let assignment_ids: HashSet<u32> = assignments.iter().map(|a| a.id).collect();
        let with_results: HashSet<&str> = self
            .results
            .iter()
            .filter(|r| assignment_ids.contains(&r.assignment_id))
            .map(|r| r.admission_number.as_str())
            .collect();

        let mut members: Vec<Student> = self
            .students
            .iter()
            .filter(|s| {
                let placed = s.form == scope.form()
                    && scope
                        .stream()
                        .is_none_or(|stream| s.stream.eq_ignore_ascii_case(stream));
                (placed && s.status == StudentStatus::Active)
                    || with_results.contains(s.admission_number.as_str())
            })
            .cloned()
            .collect();

        members.sort_by(|a, b| a.admission_number.cmp(&b.admission_number));
        Ok(members)
    }
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!(path = %path.display(), "Table missing, treating as empty");
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("reading {}", path.display()))?;
        rows.push(record);
    }

    Ok(rows)
}

fn save_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("writing {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
