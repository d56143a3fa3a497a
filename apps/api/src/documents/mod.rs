//! Document ingestion: uploaded resume / job description files turned into prompt text.

pub mod reader;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use reader::read_document;

/// Which of the two uploads a document fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Resume,
    JobDescription,
}

impl DocumentRole {
    pub const ALL: [DocumentRole; 2] = [DocumentRole::Resume, DocumentRole::JobDescription];
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRole::Resume => f.write_str("resume"),
            DocumentRole::JobDescription => f.write_str("job description"),
        }
    }
}

impl FromStr for DocumentRole {
    type Err = String;

    /// Accepts the path segment used by the upload route.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(DocumentRole::Resume),
            "job_description" | "jd" => Ok(DocumentRole::JobDescription),
            other => Err(format!("unknown document role '{other}'")),
        }
    }
}

/// Declared format, taken from the uploaded file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Pdf,
}

impl DocumentFormat {
    /// `.txt` and `.pdf`, case-insensitive. Anything else is unsupported.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("txt") {
            Some(DocumentFormat::PlainText)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(DocumentFormat::Pdf)
        } else {
            None
        }
    }
}

/// A successfully read upload. The derived text is computed once and never
/// mutated; a new upload for the same role replaces the whole document.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub role: DocumentRole,
    pub file_name: String,
    pub format: DocumentFormat,
    pub byte_len: usize,
    #[serde(skip)]
    pub text: String,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_file_name("resume.TXT"),
            Some(DocumentFormat::PlainText)
        );
        assert_eq!(
            DocumentFormat::from_file_name("jd.final.Pdf"),
            Some(DocumentFormat::Pdf)
        );
    }

    #[test]
    fn test_format_rejects_unknown_and_missing_extensions() {
        assert_eq!(DocumentFormat::from_file_name("resume.docx"), None);
        assert_eq!(DocumentFormat::from_file_name("resume"), None);
        assert_eq!(DocumentFormat::from_file_name("pdf"), None);
    }

    #[test]
    fn test_role_parses_route_segments() {
        assert_eq!("resume".parse::<DocumentRole>(), Ok(DocumentRole::Resume));
        assert_eq!(
            "job_description".parse::<DocumentRole>(),
            Ok(DocumentRole::JobDescription)
        );
        assert_eq!("jd".parse::<DocumentRole>(), Ok(DocumentRole::JobDescription));
        assert!("cover_letter".parse::<DocumentRole>().is_err());
    }
}
