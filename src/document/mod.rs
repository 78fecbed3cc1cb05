/*!
 * Submission document reading.
 *
 * Text is extracted from two kinds of files:
 * - `docx`: Word documents, read paragraph by paragraph
 * - plain text: strict UTF-8
 */

use std::path::Path;

use log::debug;

use crate::errors::DocumentError;

pub mod docx;

pub use docx::{feedback_document, paragraphs};

/// Kind of document a submission was uploaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Office Open XML word processing document
    Docx,
    /// UTF-8 text file
    PlainText,
}

impl DocumentKind {
    /// Determine the document kind from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::PlainText),
            _ => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Whether the path carries an extension this reader understands
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// Extract the text of an in-memory document
///
/// DOCX paragraphs are joined with `\n`, empty paragraphs included.
/// Plain text is decoded as UTF-8 verbatim; invalid bytes are an error.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, DocumentError> {
    match kind {
        DocumentKind::Docx => Ok(docx::paragraphs(bytes)?.join("\n")),
        DocumentKind::PlainText => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

/// Read a document from disk and extract its text
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String, DocumentError> {
    let path = path.as_ref();
    let kind = DocumentKind::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let text = extract_text(&bytes, kind)?;

    debug!("Read {:?} document {:?} ({} chars)", kind, path, text.chars().count());
    Ok(text)
}
