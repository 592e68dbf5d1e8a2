//! Document text extraction: raw upload bytes in, normalized plain text out.
//!
//! Extraction is local and deterministic, so failures are never retried.

pub mod docx;
pub mod handlers;
pub mod normalize;
pub mod pdf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub use normalize::{normalize, TextStats};

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Document is corrupt or encrypted: {0}")]
    CorruptOrEncrypted(String),
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Maps an upload MIME type to a kind. Generic types such as
    /// `application/octet-stream` map to `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case(PDF_MIME) {
            Some(Self::Pdf)
        } else if essence.eq_ignore_ascii_case(DOCX_MIME) {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Maps a file name suffix (case-insensitive) to a kind.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

/// An uploaded document, consumed by [`extract`].
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub declared_kind: Option<DocumentKind>,
    pub file_name: String,
}

impl RawDocument {
    pub fn new(
        bytes: impl Into<Bytes>,
        declared_kind: Option<DocumentKind>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            declared_kind,
            file_name: file_name.into(),
        }
    }

    /// Builds a document from an upload, deriving the declared kind from its MIME type.
    pub fn from_upload(
        bytes: impl Into<Bytes>,
        content_type: Option<&str>,
        file_name: impl Into<String>,
    ) -> Self {
        let declared_kind = content_type.and_then(DocumentKind::from_mime);
        Self::new(bytes, declared_kind, file_name)
    }

    /// The declared kind, or the one implied by the file name when none was declared.
    pub fn resolved_kind(&self) -> Option<DocumentKind> {
        self.declared_kind
            .or_else(|| DocumentKind::from_file_name(&self.file_name))
    }
}

/// Normalized text pulled out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub content: String,
    pub source_kind: DocumentKind,
    pub char_count: usize,
}

impl ExtractedText {
    fn from_raw(raw: &str, source_kind: DocumentKind) -> Self {
        let content = normalize(raw);
        Self {
            char_count: content.chars().count(),
            content,
            source_kind,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }

    pub fn stats(&self) -> TextStats {
        TextStats::of(&self.content)
    }
}

/// Extracts and normalizes the text of a PDF or DOCX document.
///
/// A document with no extractable text is a success with `char_count == 0`.
pub fn extract(doc: RawDocument) -> Result<ExtractedText, ExtractionError> {
    let kind = doc.resolved_kind().ok_or_else(|| {
        ExtractionError::UnsupportedType(format!(
            "'{}' is neither a PDF nor a DOCX file",
            doc.file_name
        ))
    })?;

    let raw = match kind {
        DocumentKind::Pdf => pdf::extract_pages(&doc.bytes)?.join("\n"),
        DocumentKind::Docx => docx::extract_paragraphs(&doc.bytes)?.join("\n"),
    };

    let extracted = ExtractedText::from_raw(&raw, kind);
    info!(
        "Extracted {} chars from '{}' ({:?})",
        extracted.char_count, doc.file_name, kind
    );
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::docx::fixtures::{docx_with_body, docx_with_paragraphs};
    use super::pdf::fixtures::pdf_with_pages;
    use super::*;

    #[test]
    fn test_pdf_pages_are_joined_in_order_and_normalized() {
        let bytes = pdf_with_pages(&["Jane Doe", "Experience Python"]);
        let doc = RawDocument::from_upload(bytes, Some(PDF_MIME), "resume.pdf");

        let extracted = extract(doc).unwrap();
        assert_eq!(extracted.content, "Jane Doe\nExperience Python");
        assert_eq!(extracted.source_kind, DocumentKind::Pdf);
        assert_eq!(extracted.char_count, 26);
    }

    #[test]
    fn test_docx_paragraphs_are_joined_and_blank_lines_dropped() {
        let bytes = docx_with_paragraphs(&["Jane Doe", "", "Experience: 5 years Python"]);
        let doc = RawDocument::new(bytes, Some(DocumentKind::Docx), "resume.docx");

        let extracted = extract(doc).unwrap();
        assert_eq!(extracted.content, "Jane Doe\nExperience: 5 years Python");
        assert_eq!(extracted.source_kind, DocumentKind::Docx);
        assert_eq!(extracted.char_count, 35);
    }

    #[test]
    fn test_empty_docx_is_success_with_zero_chars() {
        let bytes = docx_with_paragraphs(&["", "   ", ""]);
        let doc = RawDocument::new(bytes, Some(DocumentKind::Docx), "blank.docx");

        let extracted = extract(doc).unwrap();
        assert!(extracted.is_empty());
        assert_eq!(extracted.content, "");
    }

    #[test]
    fn test_kind_falls_back_to_file_suffix() {
        let bytes = docx_with_paragraphs(&["Hello"]);
        let doc = RawDocument::from_upload(bytes, Some("application/octet-stream"), "CV.DOCX");
        assert_eq!(doc.resolved_kind(), Some(DocumentKind::Docx));
        assert_eq!(extract(doc).unwrap().content, "Hello");
    }

    #[test]
    fn test_declared_kind_wins_over_suffix() {
        let doc = RawDocument::from_upload(Bytes::from_static(b"x"), Some(PDF_MIME), "resume.docx");
        assert_eq!(doc.resolved_kind(), Some(DocumentKind::Pdf));
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let doc = RawDocument::from_upload(Bytes::from_static(b"plain"), Some("text/plain"), "notes.txt");
        let err = extract(doc).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));
    }

    #[test]
    fn test_garbage_bytes_never_panic() {
        let inputs: &[&[u8]] = &[
            b"",
            b"%PDF-",
            b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\ntrailer\n<<>>\n%%EOF",
            b"PK\x03\x04garbage",
            &[0xff; 64],
        ];
        for bytes in inputs {
            let pdf = RawDocument::new(bytes.to_vec(), Some(DocumentKind::Pdf), "upload.pdf");
            assert!(matches!(
                extract(pdf),
                Ok(_) | Err(ExtractionError::CorruptOrEncrypted(_))
            ));

            let docx = RawDocument::new(bytes.to_vec(), Some(DocumentKind::Docx), "upload.docx");
            assert!(matches!(
                extract(docx),
                Err(ExtractionError::CorruptOrEncrypted(_))
            ));
        }
    }

    #[test]
    fn test_docx_multiline_paragraph_is_normalized() {
        let bytes = docx_with_body(
            r#"<w:p><w:r><w:t xml:space="preserve">  Summary  </w:t><w:br/><w:br/><w:br/><w:t>Rust</w:t></w:r></w:p>"#,
        );
        let doc = RawDocument::new(bytes, Some(DocumentKind::Docx), "resume.docx");
        assert_eq!(extract(doc).unwrap().content, "Summary\nRust");
    }

    #[test]
    fn test_mime_parsing_ignores_parameters_and_case() {
        assert_eq!(
            DocumentKind::from_mime("Application/PDF; charset=binary"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(DocumentKind::from_mime(DOCX_MIME), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_mime(""), None);
    }
}
