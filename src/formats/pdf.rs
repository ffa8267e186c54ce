use crate::error::{AppError, Result};
use crate::formats::text;
use crate::formats::{ExtractedMetadata, FormatHandler};
use lopdf::{Dictionary, Document, Object};
use std::path::Path;

/// Pages read for word counting; longer documents are extrapolated.
const WORD_SAMPLE_PAGES: usize = 20;

/// Handler for PDF files.
pub struct PdfHandler;

impl PdfHandler {
    /// Extract text content from a PDF info dictionary value.
    fn extract_text(obj: &Object) -> Option<String> {
        match obj {
            Object::String(bytes, _) => {
                // Try UTF-16BE first (starts with BOM)
                if bytes.starts_with(&[0xFE, 0xFF]) {
                    let utf16: Vec<u16> = bytes[2..]
                        .chunks(2)
                        .map(|chunk| {
                            u16::from_be_bytes([chunk[0], chunk.get(1).copied().unwrap_or(0)])
                        })
                        .collect();
                    String::from_utf16(&utf16).ok()
                } else {
                    // Try as UTF-8, then Latin-1
                    Some(
                        String::from_utf8(bytes.clone())
                            .unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect()),
                    )
                }
            }
            Object::Name(name) => String::from_utf8(name.clone()).ok(),
            _ => None,
        }
    }

    /// The document information dictionary, whether inline or referenced.
    fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
        match doc.trailer.get(b"Info") {
            Ok(Object::Reference(r)) => doc.get_dictionary(*r).ok(),
            Ok(Object::Dictionary(d)) => Some(d),
            _ => None,
        }
    }

    /// Trimmed, non-empty text value of an info entry.
    fn info_text(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
        let value = match info.get(key).ok()? {
            Object::Reference(r) => doc.get_object(*r).ok()?,
            other => other,
        };

        Self::extract_text(value)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn read_info(doc: &Document, meta: &mut ExtractedMetadata) {
        let Some(info) = Self::info_dictionary(doc) else {
            return;
        };

        meta.title = Self::info_text(doc, info, b"Title");

        meta.authors = Self::info_text(doc, info, b"Author")
            .map(|a| text::split_people(&a))
            .filter(|a| !a.is_empty());

        meta.publication_year = Self::info_text(doc, info, b"CreationDate")
            .and_then(|d| text::extract_year(&d))
            .or_else(|| {
                Self::info_text(doc, info, b"ModDate").and_then(|d| text::extract_year(&d))
            });

        // Subject (used as summary)
        meta.summary = Self::info_text(doc, info, b"Subject");

        // Keywords (used as tags)
        meta.tags = Self::info_text(doc, info, b"Keywords")
            .map(|k| {
                k.split([',', ';'])
                    .filter_map(text::sanitize_tag)
                    .collect::<Vec<_>>()
            })
            .filter(|t| !t.is_empty());
    }

    /// Count words on the first pages and scale up to the full document.
    fn sample_word_count(doc: &Document) -> Option<u64> {
        let pages = doc.get_pages();
        let total_pages = pages.len() as u64;
        if total_pages == 0 {
            return None;
        }

        let sampled: u64 = pages
            .keys()
            .take(WORD_SAMPLE_PAGES)
            .map(|&page| match doc.extract_text(&[page]) {
                Ok(content) => text::count_words(&content),
                Err(e) => {
                    tracing::debug!(page = page, error = %e, "Failed to extract page text");
                    0
                }
            })
            .sum();

        let count = extrapolate_word_count(sampled, total_pages);
        (count > 0).then_some(count)
    }
}

/// Scale a word count sampled from the first pages to `total_pages`.
///
/// This is an approximation: documents longer than the sample are assumed
/// to keep the same density throughout.
pub(crate) fn extrapolate_word_count(sampled: u64, total_pages: u64) -> u64 {
    let sample = WORD_SAMPLE_PAGES as u64;
    if total_pages > sample {
        sampled * total_pages / sample
    } else {
        sampled
    }
}

impl FormatHandler for PdfHandler {
    fn extract_metadata(&self, path: &Path) -> Result<ExtractedMetadata> {
        let doc = Document::load(path).map_err(|e| AppError::Pdf(e.to_string()))?;

        let mut meta = ExtractedMetadata::default();
        Self::read_info(&doc, &mut meta);
        meta.word_count = Self::sample_word_count(&doc);

        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{PdfInfo, write_pdf};

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn reads_info_dictionary() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.pdf");
        write_pdf(
            &path,
            &[words(3).as_str()],
            &PdfInfo {
                title: Some("Designing Data"),
                author: Some("Martin Kleppmann and Ann Other; Third Person"),
                creation_date: Some("D:20170316120000Z"),
                subject: Some("Distributed systems"),
                keywords: Some("Databases, Distributed Systems;  "),
                ..Default::default()
            },
        );

        let meta = PdfHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Designing Data"));
        assert_eq!(
            meta.authors,
            Some(vec![
                "Martin Kleppmann".to_string(),
                "Ann Other".to_string(),
                "Third Person".to_string()
            ])
        );
        assert_eq!(meta.publication_year, Some(2017));
        assert_eq!(meta.summary.as_deref(), Some("Distributed systems"));
        assert_eq!(
            meta.tags,
            Some(vec!["databases".to_string(), "distributed-systems".to_string()])
        );
        assert_eq!(meta.word_count, Some(3));
    }

    #[test]
    fn mod_date_is_year_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.pdf");
        write_pdf(
            &path,
            &[words(1).as_str()],
            &PdfInfo {
                mod_date: Some("D:20010101"),
                ..Default::default()
            },
        );

        let meta = PdfHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.publication_year, Some(2001));
        assert_eq!(meta.title, None);
        assert_eq!(meta.authors, None);
    }

    #[test]
    fn long_documents_are_extrapolated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("long.pdf");
        let page = words(50);
        let pages: Vec<&str> = (0..40).map(|_| page.as_str()).collect();
        write_pdf(&path, &pages, &PdfInfo::default());

        let meta = PdfHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.word_count, Some(2000));
    }

    #[test]
    fn extrapolation_math() {
        assert_eq!(extrapolate_word_count(1000, 40), 2000);
        assert_eq!(extrapolate_word_count(1000, 20), 1000);
        assert_eq!(extrapolate_word_count(700, 5), 700);
        assert_eq!(extrapolate_word_count(1000, 31), 1550);
    }

    #[test]
    fn utf16_info_strings_decode() {
        let bytes = vec![0xFE, 0xFF, 0x00, b'H', 0x00, 0xE9];
        let obj = Object::String(bytes, lopdf::StringFormat::Literal);
        assert_eq!(PdfHandler::extract_text(&obj).as_deref(), Some("Hé"));
    }

    #[test]
    fn latin1_info_strings_decode() {
        let bytes = vec![b'C', b'a', b'f', 0xE9, b' ', 0xC0, b' ', b'l', b'a'];
        let obj = Object::String(bytes, lopdf::StringFormat::Literal);
        assert_eq!(PdfHandler::extract_text(&obj).as_deref(), Some("Café À la"));
    }

    #[test]
    fn not_a_pdf_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fake.pdf");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(PdfHandler.extract_metadata(&path).is_err());
    }
}
