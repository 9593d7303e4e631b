use serde::Serialize;

/// Letter grade for a single subject score.
///
/// | Score       | Grade | Point |
/// |-------------|-------|-------|
/// | >= 75       | A     | 1     |
/// | >= 65       | B     | 2     |
/// | >= 45       | C     | 3     |
/// | >= 30       | D     | 4     |
/// | < 30        | F     | 5     |
/// | none        | –     | 5     |
///
/// Scores outside 0..=100 are graded by the same thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    Missing,
}

impl Grade {
    pub const LETTERS: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s.is_nan() => Grade::Missing,
            Some(s) if s >= 75.0 => Grade::A,
            Some(s) if s >= 65.0 => Grade::B,
            Some(s) if s >= 45.0 => Grade::C,
            Some(s) if s >= 30.0 => Grade::D,
            Some(_) => Grade::F,
            None => Grade::Missing,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::Missing => "–",
        }
    }

    pub fn remark(&self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Very Good",
            Grade::C => "Good",
            Grade::D => "Satisfactory",
            Grade::F => "Fail",
            Grade::Missing => "No Score",
        }
    }

    /// Remark used on Swahili report cards.
    pub fn swahili_remark(&self) -> &'static str {
        match self {
            Grade::A => "Vizuri Sana",
            Grade::B => "Vizuri",
            Grade::C => "Wastani",
            Grade::D => "Dhaifu",
            Grade::F => "Mbaya Sana",
            Grade::Missing => "-",
        }
    }

    /// NECTA point, lower is better. A missing score is worth the worst point.
    pub fn point(&self) -> u8 {
        match self {
            Grade::A => 1,
            Grade::B => 2,
            Grade::C => 3,
            Grade::D => 4,
            Grade::F | Grade::Missing => 5,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Grade::A | Grade::B | Grade::C | Grade::D)
    }

    /// Score band printed in summary table headers.
    pub fn band(&self) -> &'static str {
        match self {
            Grade::A => "75-100",
            Grade::B => "65-74",
            Grade::C => "45-64",
            Grade::D => "30-44",
            Grade::F => "<30",
            Grade::Missing => "none",
        }
    }
}

/// Maps a score to its letter and English remark. Never fails:
/// a missing or NaN score yields `("–", "No Score")`.
pub fn grade_and_remark(score: Option<f64>) -> (&'static str, &'static str) {
    let grade = Grade::from_score(score);
    (grade.letter(), grade.remark())
}

/// NECTA point for a score (1 best, 5 worst).
pub fn point(score: Option<f64>) -> u8 {
    Grade::from_score(score).point()
}
