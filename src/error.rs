//! Validation failures surfaced to callers.
//!
//! Grading itself never fails; these errors cover malformed input arriving
//! at the ingestion and aggregation boundaries. They travel inside
//! `anyhow::Error` and can be recovered with `downcast_ref`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("score '{0}' is not a number")]
    NonNumericScore(String),

    #[error("score {0} is outside 0..=100")]
    ScoreOutOfRange(f64),

    #[error("form {0} is not one of 1, 2, 3, 4")]
    InvalidForm(u8),

    #[error("unknown term '{0}'")]
    UnknownTerm(String),

    #[error("no exam session for {0}")]
    UnknownSession(String),

    #[error("exam session {0} is locked")]
    SessionLocked(String),

    #[error("student {admission_number} is not part of {scope}")]
    StudentNotInScope {
        admission_number: String,
        scope: String,
    },

    #[error("unknown student {0}")]
    UnknownStudent(String),

    #[error("unknown subject {0}")]
    UnknownSubject(String),

    #[error("unknown teacher {0}")]
    UnknownTeacher(u32),

    #[error("upload token {0} does not match any assignment")]
    UnknownToken(Uuid),

    #[error("upload token {0} has already been used")]
    TokenRedeemed(Uuid),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("'{0}' is not a valid phone number")]
    InvalidPhoneNumber(String),
}
