//! DOCX text extraction.
//!
//! A DOCX file is a zip archive; the body lives in `word/document.xml`. Paragraph
//! text is collected from `w:t` runs, with `w:tab` as a tab and `w:br`/`w:cr` as a
//! line break.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Returns the text of every paragraph in document order.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        warn!("DOCX is not a readable zip archive: {e}");
        corrupt(format!("not a DOCX archive: {e}"))
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| corrupt(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let paragraphs = parse_document_xml(&xml)?;
    debug!("DOCX decoded: {} paragraph(s)", paragraphs.len());
    Ok(paragraphs)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Paragraphs nest inside text boxes, so open paragraphs are kept on a stack.
    let mut open: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => push_char(&mut open, '\t'),
                b"w:br" | b"w:cr" => push_char(&mut open, '\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| corrupt(format!("bad text in {DOCUMENT_PART}: {e}")))?;
                if let Some(paragraph) = open.last_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(corrupt(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_char(open: &mut [String], c: char) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push(c);
    }
}

fn corrupt(message: String) -> ExtractionError {
    ExtractionError::CorruptOrEncrypted(message)
}
