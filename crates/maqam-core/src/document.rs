//! Reading document resolution
//!
//! Opens the fixed-page-count PDF the bookmarks refer to and answers the
//! two questions the rest of the system asks: how many pages are there,
//! and what text is on a given page. Rasterization is out of scope; the
//! reader surface works from extracted text.

use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

/// Errors that can occur while resolving the reading document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Document file does not exist
    #[error("Document not found: '{path}'")]
    NotFound { path: PathBuf },

    /// File exists but is not a PDF
    #[error("Invalid PDF: {reason}")]
    InvalidPdf { reason: String },

    /// Encrypted documents are not supported
    #[error("Encrypted PDFs are not supported")]
    Encrypted,

    /// Document parsed but contains no pages
    #[error("Document has no pages")]
    Empty,

    /// Requested page outside the document
    #[error("Page {page} out of range (page count: {page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    /// PDF parse error
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The resolved reading document
#[derive(Debug)]
pub struct ReadingDocument {
    doc: Document,
    page_count: u32,
}

impl ReadingDocument {
    /// Open and validate a document from a filesystem path
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Open and validate a document from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        // Validate PDF header before handing to the parser
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(DocumentError::InvalidPdf {
                reason: "missing %PDF header".to_string(),
            });
        }

        let doc = Document::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(DocumentError::Encrypted);
        }

        let page_count = doc.get_pages().len() as u32;
        if page_count == 0 {
            return Err(DocumentError::Empty);
        }

        Ok(Self { doc, page_count })
    }

    /// Total number of pages
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Extracted text of the given page (1-based)
    pub fn page_text(&self, page: u32) -> Result<String, DocumentError> {
        if page == 0 || page > self.page_count {
            return Err(DocumentError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        Ok(self.doc.extract_text(&[page])?)
    }

    /// Clamp a page number into the document's valid range
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.page_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a minimal n-page PDF with "Page N" text on each page
    fn sample_pdf(pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Page {}", page))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_page_count() {
        let doc = ReadingDocument::from_bytes(&sample_pdf(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_page_text() {
        let doc = ReadingDocument::from_bytes(&sample_pdf(2)).unwrap();
        let text = doc.page_text(2).unwrap();
        assert!(text.contains("Page 2"));
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = ReadingDocument::from_bytes(&sample_pdf(2)).unwrap();

        let err = doc.page_text(0).unwrap_err();
        assert!(matches!(err, DocumentError::PageOutOfRange { page: 0, .. }));

        let err = doc.page_text(3).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::PageOutOfRange {
                page: 3,
                page_count: 2
            }
        ));
    }

    #[test]
    fn test_clamp_page() {
        let doc = ReadingDocument::from_bytes(&sample_pdf(5)).unwrap();
        assert_eq!(doc.clamp_page(0), 1);
        assert_eq!(doc.clamp_page(3), 3);
        assert_eq!(doc.clamp_page(99), 5);
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = ReadingDocument::from_bytes(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidPdf { .. }));

        let err = ReadingDocument::from_bytes(b"").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidPdf { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = ReadingDocument::open(Path::new("/nonexistent/quran.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));
    }

    #[test]
    fn test_open_from_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.pdf");
        std::fs::write(&path, sample_pdf(4)).unwrap();

        let doc = ReadingDocument::open(&path).unwrap();
        assert_eq!(doc.page_count(), 4);
    }
}
