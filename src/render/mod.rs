//! Report renderers.
//!
//! Each renderer is a pure function of ranked reports plus a [`ReportHeader`]
//! and produces an [`Artifact`]. None of them grade anything themselves.

pub mod document;
pub mod sheet;
pub mod sms;

use anyhow::Result;
use bytes::Bytes;
use chrono::NaiveDate;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeMap;
use std::io::Write;

use crate::records::Records;
use crate::records::types::Term;
use crate::scope::Scope;

/// Header metadata shared by every rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub school_name: String,
    pub school_contact: String,
    pub term: Term,
    pub year: u16,
    pub scope_label: String,
    /// Date printed on the document. Passed in so output is reproducible.
    pub generated_on: NaiveDate,
    /// Subject code to display name. Codes without a name print as-is.
    pub subject_names: BTreeMap<String, String>,
}

impl ReportHeader {
    pub fn new(
        school_name: &str,
        school_contact: &str,
        scope: &Scope,
        records: &Records,
        generated_on: NaiveDate,
    ) -> Self {
        Self {
            school_name: school_name.to_string(),
            school_contact: school_contact.to_string(),
            term: scope.term(),
            year: scope.year(),
            scope_label: scope.label(),
            generated_on,
            subject_names: records
                .subjects()
                .iter()
                .map(|s| (s.code.clone(), s.name.clone()))
                .collect(),
        }
    }

    pub fn subject_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.subject_names.get(code).map_or(code, String::as_str)
    }
}

/// A rendered file ready to be written, attached or uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl Artifact {
    /// Gzip-compresses the body and appends `.gz` to the file name.
    pub fn gzipped(&self) -> Result<Artifact> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body)?;
        let compressed = encoder.finish()?;

        Ok(Artifact {
            file_name: format!("{}.gz", self.file_name),
            content_type: "application/gzip",
            body: Bytes::from(compressed),
        })
    }
}

/// File-name friendly form of a label: spaces become underscores, other
/// punctuation is dropped.
pub(crate) fn file_stem(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| match c {
            ' ' | '/' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_gzipped_round_trips() {
        let artifact = Artifact {
            file_name: "results.csv".to_string(),
            content_type: "text/csv",
            body: Bytes::from_static(b"Position,Total\n1,540\n"),
        };
        let gz = artifact.gzipped().unwrap();
        assert_eq!(gz.file_name, "results.csv.gz");

        let mut decoded = String::new();
        GzDecoder::new(&gz.body[..]).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded.as_bytes(), &artifact.body[..]);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Form 2 (All Streams)"), "Form_2_All_Streams");
        assert_eq!(file_stem("Mid Term"), "Mid_Term");
    }
}
