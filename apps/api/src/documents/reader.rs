//! Document Reader: converts an uploaded `.txt` or `.pdf` into plain text.
//!
//! Plain text is decoded lossily and never fails. PDFs are extracted page by
//! page with `pdf-extract`; a library error (or panic) is reported as
//! `DocumentReadFailure`. A PDF that yields no text is valid empty text.

use std::any::Any;
use std::panic;

use chrono::Utc;
use tracing::{debug, warn};

use crate::documents::{DocumentFormat, DocumentRole, SourceDocument};
use crate::errors::TaskError;

/// Reads one upload. The bytes are only borrowed; nothing is retained past the call.
///
/// The format check happens before any decoding, so an unsupported file is
/// rejected without a partial read.
pub fn read_document(
    role: DocumentRole,
    file_name: &str,
    bytes: &[u8],
) -> Result<SourceDocument, TaskError> {
    let format =
        DocumentFormat::from_file_name(file_name).ok_or(TaskError::UnsupportedFormat { role })?;

    let text = match format {
        DocumentFormat::PlainText => decode_plain_text(bytes),
        DocumentFormat::Pdf => extract_pdf_text(bytes).map_err(|message| {
            warn!("PDF extraction failed for {role} '{file_name}': {message}");
            TaskError::DocumentReadFailure { role, message }
        })?,
    };

    debug!(
        "Read {role} '{file_name}' ({format:?}): {} bytes -> {} chars",
        bytes.len(),
        text.chars().count()
    );

    Ok(SourceDocument {
        role,
        file_name: file_name.to_string(),
        format,
        byte_len: bytes.len(),
        text,
        uploaded_at: Utc::now(),
    })
}

/// Invalid UTF-8 sequences become U+FFFD rather than failing the read.
fn decode_plain_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(panic_message)?
        .map_err(|e| e.to_string())?;
    Ok(join_pages(&pages))
}

/// Concatenates page texts in page order and trims the result.
fn join_pages(pages: &[String]) -> String {
    pages.concat().trim().to_string()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "PDF library panicked".to_string()
    }
}
