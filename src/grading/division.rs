use serde::Serialize;
use std::fmt;

/// Number of subjects that make up a division.
pub const BEST_OF: usize = 7;

/// Fewest passed subjects among the best seven for any division above 0.
pub const MIN_PASSES: usize = 2;

/// Overall performance tier computed from the best seven subject points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
    Zero,
    /// Fewer than seven subjects were examined.
    NotApplicable,
}

impl Division {
    pub const ALL: [Division; 6] = [
        Division::I,
        Division::II,
        Division::III,
        Division::IV,
        Division::Zero,
        Division::NotApplicable,
    ];

    pub fn roman(&self) -> &'static str {
        match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
            Division::Zero => "0",
            Division::NotApplicable => "N/A",
        }
    }

    pub fn remark(&self) -> &'static str {
        match self {
            Division::I => "Excellent",
            Division::II => "Very Good",
            Division::III => "Good",
            Division::IV => "Pass",
            Division::Zero => "Fail",
            Division::NotApplicable => "Insufficient Subjects",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

/// Classifies the best-seven point sum.
///
/// `examined_count` is the number of subjects with a score; below seven the
/// result is [`Division::NotApplicable`] whatever the points. With fewer than
/// two passes among the best seven the division is 0.
///
/// | Points  | Division |
/// |---------|----------|
/// | <= 17   | I        |
/// | <= 21   | II       |
/// | <= 25   | III      |
/// | <= 33   | IV       |
/// | > 33    | 0        |
pub fn division(total_points: u32, passed_count: usize, examined_count: usize) -> Division {
    if examined_count < BEST_OF {
        return Division::NotApplicable;
    }
    if passed_count < MIN_PASSES {
        return Division::Zero;
    }
    match total_points {
        0..=17 => Division::I,
        18..=21 => Division::II,
        22..=25 => Division::III,
        26..=33 => Division::IV,
        _ => Division::Zero,
    }
}

/// Same as [`division`] but as the `(roman, remark)` pair printed on reports.
pub fn division_and_remark(
    total_points: u32,
    passed_count: usize,
    examined_count: usize,
) -> (&'static str, &'static str) {
    let d = division(total_points, passed_count, examined_count);
    (d.roman(), d.remark())
}
