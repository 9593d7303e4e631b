//! Plain-text result messages for parents.
//!
//! Messages are a single line of fields joined by `" | "`. Text is reduced to
//! a GSM-7 safe subset before sending, and long messages are split between
//! fields so a subject and its score always travel together.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::ReportHeader;
use crate::aggregate::AggregatedReport;
use crate::aggregate::utility::format_score;
use crate::records::types::{Student, form_to_swahili};

/// Separator between message fields.
pub const FIELD_SEPARATOR: &str = " | ";

/// Single-part limit for GSM-7 text, in septets.
pub const GSM7_LIMIT: usize = 160;

/// Single-part limit for UCS-2 text, in UTF-16 code units.
pub const UCS2_LIMIT: usize = 70;

/// Longest subject code printed in a message.
const MAX_SUBJECT_CODE: usize = 12;

const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";
const GSM7_EXTENSION: &str = "^{}\\[~]|€\u{0c}";

const REPLACEMENTS: &[(char, &str)] = &[
    ('—', "-"),
    ('–', "-"),
    ('―', "-"),
    ('…', "..."),
    ('“', "\""),
    ('”', "\""),
    ('„', "\""),
    ('‘', "'"),
    ('’', "'"),
    ('‚', "'"),
    ('•', "-"),
    ('·', "-"),
    ('`', "'"),
    ('´', "'"),
    ('\u{00A0}', " "),
    ('\u{200B}', ""),
    ('\u{200C}', ""),
    ('\u{200D}', ""),
    ('\u{2060}', ""),
    ('¥', "Y"),
    ('¢', "c"),
    ('©', "(c)"),
    ('®', "(R)"),
    ('™', "(TM)"),
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

impl Encoding {
    pub fn of(text: &str) -> Self {
        if text
            .chars()
            .all(|c| GSM7_BASIC.contains(c) || GSM7_EXTENSION.contains(c))
        {
            Encoding::Gsm7
        } else {
            Encoding::Ucs2
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Encoding::Gsm7 => GSM7_LIMIT,
            Encoding::Ucs2 => UCS2_LIMIT,
        }
    }

    /// Length as counted by the carrier: extension characters take two septets.
    pub fn len(&self, text: &str) -> usize {
        match self {
            Encoding::Gsm7 => text
                .chars()
                .map(|c| if GSM7_EXTENSION.contains(c) { 2 } else { 1 })
                .sum(),
            Encoding::Ucs2 => text.encode_utf16().count(),
        }
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || ",.!?;:'\"-()|/@_&#%+=<>*".contains(c)
}

/// Transliterates to plain ASCII letters and strips anything outside the safe set.
pub fn sanitize(text: &str) -> String {
    let mut replaced = String::with_capacity(text.len());
    for c in text.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => replaced.push_str(to),
            None => replaced.push(c),
        }
    }

    let stripped: String = replaced
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| is_safe(*c))
        .collect();

    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Sanitized text that cannot be mistaken for a field separator.
fn field(text: &str) -> String {
    sanitize(text).replace('|', "/")
}

/// Builds the one-line result message for a student's parent.
pub fn result_message(student: &Student, report: &AggregatedReport, header: &ReportHeader) -> String {
    let mut parts = vec![
        format!("Matokeo ya {}", field(&student.full_name)),
        field(&form_to_swahili(student.form)),
        format!("{} {}", field(header.term.label()), header.year),
    ];

    for line in &report.subjects {
        let code: String = field(&line.subject).chars().take(MAX_SUBJECT_CODE).collect();
        let score = line.score.map_or_else(|| "NA".to_string(), format_score);
        parts.push(format!("{code}: {score}"));
    }

    parts.push(format!("Pointi: {}", report.best_seven_points));
    parts.push(format!("Wastani: {}", format_score(report.mean)));
    parts.push(format!("Daraja: {}", report.division));
    parts.push(format!(
        "Nafasi Darasani: {} kati ya {}",
        report.rank, report.cohort_size
    ));

    parts.join(FIELD_SEPARATOR)
}

/// Announcement text. Parents get a greeting naming their child.
pub fn announcement_message(title: &str, message: &str, child: Option<&Student>) -> String {
    let body = format!("{}: {}", field(title), sanitize(message));
    match child {
        Some(student) => format!(
            "Mzazi wa {} ({}), {}",
            field(&student.full_name),
            form_to_swahili(student.form),
            body
        ),
        None => body,
    }
}

/// Splits a message into transport-sized chunks at field separators.
///
/// The limit is 160 for GSM-7 text and 70 for anything else. A field is never
/// cut; one longer than the limit becomes its own chunk. Joining the chunks
/// with [`FIELD_SEPARATOR`] gives back the original message.
pub fn split_message(message: &str) -> Vec<String> {
    let encoding = Encoding::of(message);
    let limit = encoding.limit();
    let mut chunks = Vec::new();
    let mut current = String::new();

    for part in message.split(FIELD_SEPARATOR) {
        if current.is_empty() {
            current.push_str(part);
            continue;
        }
        let candidate = format!("{current}{FIELD_SEPARATOR}{part}");
        if encoding.len(&candidate) > limit {
            chunks.push(std::mem::take(&mut current));
            current.push_str(part);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{SubjectScores, tally};
    use crate::records::types::{Gender, StudentStatus, Term};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn header() -> ReportHeader {
        ReportHeader {
            school_name: "Paranga Secondary School".to_string(),
            school_contact: String::new(),
            term: Term::MidTerm,
            year: 2025,
            scope_label: "Form 2 A".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            subject_names: BTreeMap::new(),
        }
    }

    fn student(name: &str) -> Student {
        Student {
            admission_number: "PAR/2025/001".to_string(),
            full_name: name.to_string(),
            gender: Gender::Female,
            form: 2,
            stream: "A".to_string(),
            parent_name: "Juma".to_string(),
            parent_contact: "0712345678".to_string(),
            status: StudentStatus::Active,
            enrolled_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_sanitize_transliterates() {
        assert_eq!(sanitize("  Zoë   Müller—Njoroge  "), "Zoe Muller-Njoroge");
        assert_eq!(sanitize("Fees: $40 “now”…"), "Fees: 40 \"now\"...");
        assert_eq!(sanitize("line\none"), "line one");
        assert_eq!(sanitize("📚 Exams"), "Exams");
    }

    #[test]
    fn test_missing_score_renders_na() {
        let subjects = vec!["CIV".to_string(), "MATH".to_string()];
        let scores: SubjectScores = [("MATH".to_string(), Some(72.5))].into_iter().collect();
        let mut report = tally("PAR/2025/001", &subjects, &scores);
        report.rank = 3;
        report.cohort_size = 40;

        let msg = result_message(&student("Asha Juma"), &report, &header());
        assert_eq!(
            msg,
            "Matokeo ya Asha Juma | Kidato cha Pili | Mid Term 2025 | CIV: NA | MATH: 72.5 | \
             Pointi: 2 | Wastani: 72.5 | Daraja: N/A | Nafasi Darasani: 3 kati ya 40"
        );
    }

    #[test]
    fn test_names_cannot_inject_separators() {
        let subjects = vec!["MATH".to_string()];
        let report = tally("PAR/2025/001", &subjects, &SubjectScores::new());
        let msg = result_message(&student("Asha | Juma"), &report, &header());
        assert!(msg.starts_with("Matokeo ya Asha / Juma | "));
    }

    #[test]
    fn test_short_message_is_one_chunk() {
        assert_eq!(split_message("A | B"), vec!["A | B".to_string()]);
    }

    #[test]
    fn test_split_keeps_fields_whole() {
        let fields: Vec<String> = (0..30).map(|i| format!("SUBJ{i:02}: {}", 40 + i)).collect();
        let message = fields.join(FIELD_SEPARATOR);
        let chunks = split_message(&message);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(Encoding::Gsm7.len(chunk) <= GSM7_LIMIT);
            for part in chunk.split(FIELD_SEPARATOR) {
                assert!(fields.contains(&part.to_string()), "broken field {part:?}");
            }
        }
        assert_eq!(chunks.join(FIELD_SEPARATOR), message);
    }

    #[test]
    fn test_unicode_uses_shorter_limit() {
        let fields: Vec<String> = (0..10).map(|i| format!("Somo {i}: alama ✓")).collect();
        let message = fields.join(FIELD_SEPARATOR);
        assert_eq!(Encoding::of(&message), Encoding::Ucs2);

        let chunks = split_message(&message);
        for chunk in &chunks {
            assert!(chunk.encode_utf16().count() <= UCS2_LIMIT);
        }
        assert_eq!(chunks.join(FIELD_SEPARATOR), message);
    }

    #[test]
    fn test_oversized_field_is_not_cut() {
        let long = "X".repeat(200);
        let message = format!("A{FIELD_SEPARATOR}{long}{FIELD_SEPARATOR}B");
        let chunks = split_message(&message);
        assert_eq!(chunks, vec!["A".to_string(), long, "B".to_string()]);
    }

    #[test]
    fn test_extension_characters_count_double() {
        assert_eq!(Encoding::Gsm7.len("a|b"), 4);
        assert_eq!(Encoding::Gsm7.len("abc"), 3);
    }

    #[test]
    fn test_announcement_for_parent() {
        let text = announcement_message("Mkutano", "Wazazi wote wanakaribishwa.", Some(&student("Asha Juma")));
        assert_eq!(
            text,
            "Mzazi wa Asha Juma (Kidato cha Pili), Mkutano: Wazazi wote wanakaribishwa."
        );
        assert_eq!(announcement_message("Staff", "Meeting at 2", None), "Staff: Meeting at 2");
    }
}
