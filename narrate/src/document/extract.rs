//! Per-page text extraction.

use super::DocumentUnit;
use crate::error::{ConversionError, Result};

/// Splits a document into ordered units of plain text.
pub trait TextExtractor: Send + Sync {
    /// Short format name for logging
    fn name(&self) -> &'static str;

    /// Extract one unit per page, indexed from zero in page order.
    /// Pages without text yield empty units rather than being skipped.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<DocumentUnit>>;
}

/// Extracts page text from PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<DocumentUnit>> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ConversionError::Extraction(format!("not a readable PDF: {}", e)))?;

        let pages = doc.get_pages();
        log::debug!("PDF has {} pages", pages.len());

        let units = pages
            .keys()
            .enumerate()
            .map(|(index, &page_number)| {
                // A page whose content cannot be decoded counts as blank.
                let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
                    log::debug!("No text on page {}: {}", page_number, e);
                    String::new()
                });
                DocumentUnit::new(index, text)
            })
            .collect();
        Ok(units)
    }
}

/// Treats UTF-8 text as a document; form feeds separate pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<DocumentUnit>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ConversionError::Extraction(format!("text is not valid UTF-8: {}", e)))?;
        Ok(text
            .split('\x0c')
            .enumerate()
            .map(|(index, page)| DocumentUnit::new(index, page))
            .collect())
    }
}
