//! Seekable statement sources and PDF text extraction.
//!
//! A single upload is read twice (year resolution, then content), so every
//! read goes through [`read_from_start`], which starts at offset 0 and leaves
//! the source rewound.

use std::io::{Read, Seek, SeekFrom};

use lopdf::Document;
use tracing::debug;

use crate::error::Result;
use crate::table::{Table, page_lines, page_table};

/// Anything that can be re-read from the beginning.
pub trait StatementSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> StatementSource for T {}

/// Read every byte from offset 0 and rewind the source afterwards.
pub fn read_from_start<S: StatementSource + ?Sized>(src: &mut S) -> Result<Vec<u8>> {
    src.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    src.read_to_end(&mut bytes)?;
    src.seek(SeekFrom::Start(0))?;
    Ok(bytes)
}

/// A loaded statement PDF.
pub struct PdfStatement {
    doc: Document,
}

impl PdfStatement {
    pub fn load<S: StatementSource + ?Sized>(src: &mut S) -> Result<Self> {
        let bytes = read_from_start(src)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Text of every page in page order. Pages without extractable text come
    /// back as empty strings.
    pub fn page_texts(&self) -> Vec<String> {
        self.doc
            .get_pages()
            .into_keys()
            .map(|page_num| self.page_text(page_num))
            .collect()
    }

    /// Text of one 1-based page in reading order, one line per baseline.
    /// Empty when the page is missing or unreadable.
    pub fn page_text(&self, page_num: u32) -> String {
        self.page_content(page_num)
            .map(|content| page_lines(&content).join("\n"))
            .unwrap_or_default()
    }

    pub fn first_page_text(&self) -> String {
        self.doc
            .get_pages()
            .into_keys()
            .next()
            .map(|n| self.page_text(n))
            .unwrap_or_default()
    }

    /// All non-empty page texts joined by newlines.
    pub fn full_text(&self) -> String {
        self.page_texts()
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One 1-based page laid out as rows and columns by text position.
    pub fn page_table(&self, page_num: u32) -> Table {
        self.page_content(page_num)
            .map(|content| page_table(&content))
            .unwrap_or_default()
    }

    /// Decoded content stream of one 1-based page.
    fn page_content(&self, page_num: u32) -> Option<Vec<u8>> {
        let Some(page_id) = self.doc.get_pages().get(&page_num).copied() else {
            debug!("page {} not present ({} pages)", page_num, self.page_count());
            return None;
        };
        match self.doc.get_page_content(page_id) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("page {} content unreadable: {}", page_num, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_from_start_rewinds() {
        let mut cur = Cursor::new(b"abcdef".to_vec());
        cur.seek(SeekFrom::Start(4)).unwrap();
        let bytes = read_from_start(&mut cur).unwrap();
        assert_eq!(bytes, b"abcdef");
        assert_eq!(cur.position(), 0);
        assert_eq!(read_from_start(&mut cur).unwrap(), b"abcdef");
    }

    #[test]
    fn test_garbage_is_not_a_pdf() {
        let mut cur = Cursor::new(b"not a pdf".to_vec());
        assert!(PdfStatement::load(&mut cur).is_err());
        assert_eq!(cur.position(), 0);
    }
}
