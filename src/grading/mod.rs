//! NECTA grading law.
//!
//! Every report, sheet and message grades through these functions; nothing
//! else in the crate compares a score against a threshold.

pub mod division;
pub mod grade;

pub use division::{BEST_OF, Division, division, division_and_remark};
pub use grade::{Grade, grade_and_remark, point};
