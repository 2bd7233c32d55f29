//! CV text extraction for uploaded documents (PDF or plain text).

use crate::error::{AppError, AppResult};
use regex::Regex;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

pub trait DocumentExtractor: Send + Sync {
    /// Extract readable text. `filename` is only a hint for the file type.
    fn extract_text(&self, bytes: &[u8], filename: &str) -> AppResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Text,
}

/// Decide the document type from the extension, confirmed by the PDF magic bytes.
fn detect_kind(bytes: &[u8], filename: &str) -> AppResult<DocumentKind> {
    let name = filename.to_lowercase();
    let has_magic = bytes.starts_with(PDF_MAGIC);

    if name.ends_with(".pdf") {
        return if has_magic {
            Ok(DocumentKind::Pdf)
        } else {
            Err(AppError::DocumentError(
                "File appears to be corrupted or not a valid PDF".to_string(),
            ))
        };
    }
    if name.ends_with(".txt") || name.ends_with(".text") {
        return Ok(DocumentKind::Text);
    }
    Ok(if has_magic {
        DocumentKind::Pdf
    } else {
        DocumentKind::Text
    })
}

/// UTF-8 first, then Latin-1, which maps every byte to a code point and cannot fail.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Document is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

// pdf-extract can panic on some malformed files, so the parse runs behind catch_unwind.
fn extract_pdf(bytes: &[u8], filename: &str) -> AppResult<String> {
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!(filename, error = %e, "PDF extraction failed");
            Err(AppError::DocumentError(format!("Failed to extract text from PDF: {}", e)))
        }
        Err(_) => {
            warn!(filename, "PDF parser panicked");
            Err(AppError::DocumentError(
                "Failed to extract text from PDF: malformed document".to_string(),
            ))
        }
    }
}

/// Extractor backed by `pdf-extract` for PDFs and plain decoding for text files.
pub struct CvExtractor {
    blank_lines: Regex,
    spaces: Regex,
    artifacts: Regex,
}

impl CvExtractor {
    pub fn new() -> AppResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| AppError::Internal(format!("invalid cleanup pattern: {}", e)))
        };
        Ok(Self {
            blank_lines: compile(r"\n\s*\n")?,
            spaces: compile(r" +")?,
            artifacts: compile(r"[^\w\s\-.,()@+\n]")?,
        })
    }

    fn clean(&self, text: &str) -> String {
        let text = self.blank_lines.replace_all(text, "\n\n");
        let text = self.spaces.replace_all(&text, " ");
        let text = self.artifacts.replace_all(&text, " ");
        text.trim().to_string()
    }
}

impl DocumentExtractor for CvExtractor {
    fn extract_text(&self, bytes: &[u8], filename: &str) -> AppResult<String> {
        let raw = match detect_kind(bytes, filename)? {
            DocumentKind::Pdf => extract_pdf(bytes, filename)?,
            DocumentKind::Text => decode_text(bytes),
        };

        let cleaned = self.clean(&raw);
        debug!(filename, bytes = bytes.len(), chars = cleaned.len(), "Extracted document text");
        Ok(cleaned)
    }
}
