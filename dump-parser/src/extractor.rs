//! PDF-to-text conversion via `lopdf`. Pure format conversion, no semantic
//! validation of the extracted content.

use lopdf::Document;
use tracing::debug;

use crate::ParseError;

/// Extract text for every page, in page order. Fails only when the byte
/// stream cannot be opened as a PDF or the document is encrypted; a single
/// page whose content streams do not decode contributes an empty string.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ParseError> {
    let doc = Document::load_mem(bytes).map_err(|e| ParseError::UnreadablePdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ParseError::UnreadablePdf("document is encrypted".into()));
    }

    let mut pages = Vec::new();
    for (page_no, _object_id) in doc.get_pages() {
        match doc.extract_text(&[page_no]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                debug!(page = page_no, error = %e, "page text extraction failed");
                pages.push(String::new());
            }
        }
    }
    Ok(pages)
}
