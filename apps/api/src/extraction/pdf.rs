use tracing::warn;

use crate::extraction::ExtractError;

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Extracts the text layer of a PDF with `pdf-extract`.
///
/// Encrypted, corrupt and truncated files all surface as `ExtractionFailure`.
/// Image-only (scanned) PDFs decode to blank text and are rejected by the
/// caller.
pub fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    if !has_pdf_header(data) {
        return Err(ExtractError::failure("the file is not a valid PDF"));
    }

    pdf_extract::extract_text_from_mem(data).map_err(|e| {
        warn!("PDF extraction failed: {e}");
        ExtractError::failure(format!(
            "the PDF could not be read; it may be corrupt or password-protected ({e})"
        ))
    })
}

fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
