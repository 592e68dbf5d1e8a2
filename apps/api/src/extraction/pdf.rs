//! PDF text extraction via `pdf-extract`.

use std::panic;

use tracing::{debug, warn};

use super::ExtractionError;

/// Extracts the text of every page in document order.
///
/// `pdf-extract` can panic on some malformed inputs, so the call runs inside
/// `catch_unwind` and a panic is reported as a corrupt document.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));

    match outcome {
        Ok(Ok(pages)) => {
            debug!("PDF decoded: {} page(s)", pages.len());
            Ok(pages)
        }
        Ok(Err(e)) => {
            warn!("PDF decode failed: {e}");
            Err(ExtractionError::CorruptOrEncrypted(format!(
                "unable to read PDF: {e}"
            )))
        }
        Err(_) => {
            warn!("PDF decoder panicked on malformed input");
            Err(ExtractionError::CorruptOrEncrypted(
                "unable to read PDF: malformed document structure".to_string(),
            ))
        }
    }
}
