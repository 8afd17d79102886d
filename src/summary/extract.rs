use tracing::warn;

/// Extract the text of one PDF document
///
/// Returns an empty string when nothing is readable; a malformed file skips
/// quietly instead of failing the whole upload.
pub fn extract_pdf_text(bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("PDF text extraction failed: {}", e);
            String::new()
        }
    }
}
