//! Cohort scopes: which exam sessions, and so which students, are compared together.

use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;
use crate::records::types::{ExamSession, SessionKey, Term, validate_form};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Scope {
    /// One stream's exam session.
    Session {
        form: u8,
        stream: String,
        term: Term,
        year: u16,
    },
    /// Every stream of a form sitting the same term.
    Form { form: u8, term: Term, year: u16 },
}

impl Scope {
    pub fn session(key: &SessionKey) -> Self {
        Scope::Session {
            form: key.form,
            stream: key.stream.clone(),
            term: key.term,
            year: key.year,
        }
    }

    /// Builds a session scope when a stream is given and a form-wide scope otherwise.
    pub fn new(form: u8, stream: Option<&str>, term: Term, year: u16) -> Self {
        match stream {
            Some(stream) => Scope::Session {
                form,
                stream: stream.trim().to_string(),
                term,
                year,
            },
            None => Scope::Form { form, term, year },
        }
    }

    pub fn form(&self) -> u8 {
        match self {
            Scope::Session { form, .. } | Scope::Form { form, .. } => *form,
        }
    }

    pub fn term(&self) -> Term {
        match self {
            Scope::Session { term, .. } | Scope::Form { term, .. } => *term,
        }
    }

    pub fn year(&self) -> u16 {
        match self {
            Scope::Session { year, .. } | Scope::Form { year, .. } => *year,
        }
    }

    pub fn stream(&self) -> Option<&str> {
        match self {
            Scope::Session { stream, .. } => Some(stream),
            Scope::Form { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_form(self.form())?;
        if let Scope::Session { stream, .. } = self {
            if stream.is_empty() {
                return Err(ValidationError::UnknownSession(self.to_string()));
            }
        }
        Ok(())
    }

    pub fn covers(&self, session: &ExamSession) -> bool {
        if session.form != self.form() || session.term != self.term() || session.year != self.year()
        {
            return false;
        }
        match self.stream() {
            Some(stream) => session.stream.eq_ignore_ascii_case(stream),
            None => true,
        }
    }

    /// Short label printed on exports, e.g. `Form 2 A` or `Form 2 (All Streams)`.
    pub fn label(&self) -> String {
        match self {
            Scope::Session { form, stream, .. } => format!("Form {form} {stream}"),
            Scope::Form { form, .. } => format!("Form {form} (All Streams)"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} {}", self.label(), self.term(), self.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: u32, form: u8, stream: &str) -> ExamSession {
        ExamSession {
            id,
            form,
            stream: stream.to_string(),
            term: Term::Annual,
            year: 2025,
            is_locked: false,
        }
    }

    #[test]
    fn test_session_scope_covers_only_its_stream() {
        let scope = Scope::new(2, Some("A"), Term::Annual, 2025);
        assert!(scope.covers(&session(1, 2, "A")));
        assert!(scope.covers(&session(1, 2, "a")));
        assert!(!scope.covers(&session(2, 2, "B")));
        assert!(!scope.covers(&session(3, 3, "A")));
    }

    #[test]
    fn test_form_scope_covers_every_stream() {
        let scope = Scope::new(2, None, Term::Annual, 2025);
        assert!(scope.covers(&session(1, 2, "A")));
        assert!(scope.covers(&session(2, 2, "B")));
        assert!(!scope.covers(&session(3, 1, "A")));
        assert_eq!(scope.label(), "Form 2 (All Streams)");
    }

    #[test]
    fn test_malformed_scope() {
        assert_eq!(
            Scope::new(9, None, Term::Annual, 2025).validate(),
            Err(ValidationError::InvalidForm(9))
        );
        assert!(Scope::new(1, Some("  "), Term::Annual, 2025).validate().is_err());
        assert!(Scope::new(1, Some("B"), Term::Annual, 2025).validate().is_ok());
    }
}
