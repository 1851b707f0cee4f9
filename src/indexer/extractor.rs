use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use super::walker::SupportedFormat;
use crate::error::{RagError, Result};

/// Text pulled out of a source document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: usize,
    /// Page texts, each followed by a blank-line separator.
    pub text: String,
}

pub fn extract_text(path: &Path, format: SupportedFormat) -> Result<ExtractedDocument> {
    match format {
        SupportedFormat::PlainText => extract_plain_text(path),
        SupportedFormat::Pdf => extract_pdf(path),
    }
}

fn extraction_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::Extraction {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn extract_plain_text(path: &Path) -> Result<ExtractedDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| extraction_error(path, e.to_string()))?;
    Ok(join_pages(vec![text]))
}

fn extract_pdf(path: &Path) -> Result<ExtractedDocument> {
    // pdf-extract panics on some malformed inputs instead of returning an error
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)));

    match outcome {
        Ok(Ok(pages)) => Ok(join_pages(pages)),
        Ok(Err(e)) => Err(extraction_error(path, e.to_string())),
        Err(panic_info) => {
            let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                format!("PDF parser panicked: {}", s)
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                format!("PDF parser panicked: {}", s)
            } else {
                "PDF parser panicked".to_string()
            };
            Err(extraction_error(path, message))
        }
    }
}

fn join_pages(pages: Vec<String>) -> ExtractedDocument {
    let count = pages.len();
    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push_str("\n\n");
    }
    ExtractedDocument { pages: count, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::chunker::split_paragraphs;

    #[test]
    fn test_pages_followed_by_blank_line() {
        let doc = join_pages(vec!["page one".to_string(), "page two".to_string()]);
        assert_eq!(doc.pages, 2);
        assert_eq!(doc.text, "page one\n\npage two\n\n");
        assert_eq!(split_paragraphs(&doc.text), vec!["page one", "page two"]);
    }

    #[test]
    fn test_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "alpha\n\nbeta").unwrap();

        let doc = extract_text(&path, SupportedFormat::PlainText).unwrap();
        assert_eq!(doc.pages, 1);
        assert_eq!(split_paragraphs(&doc.text), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        let err = extract_text(Path::new("/nonexistent/missing.txt"), SupportedFormat::PlainText)
            .unwrap_err();
        assert!(matches!(err, RagError::Extraction { .. }));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = extract_text(&path, SupportedFormat::Pdf).unwrap_err();
        assert!(matches!(err, RagError::Extraction { .. }));
    }
}
