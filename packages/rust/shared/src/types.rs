//! Core domain types for Wallabook exports.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One saved article, as returned by the article store.
///
/// Entries are read-only inputs: the export never creates, mutates or
/// deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store-owned identifier.
    pub id: u64,
    /// Article title.
    pub title: String,
    /// Article body, usually HTML extracted by the store.
    pub content: String,
}

impl Entry {
    /// Size of the content in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A rendered, book-ready form of one accepted [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Chapter heading shown in the table of contents.
    pub heading: String,
    /// Chapter body markup (XHTML fragment).
    pub body: String,
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// The in-memory book handed to a book writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Book title.
    pub title: String,
    /// Book author.
    pub author: String,
    /// Chapters in insertion order.
    pub sections: Vec<Section>,
}

impl Book {
    /// Create an empty book with the given metadata.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            sections: Vec::new(),
        }
    }

    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ExportOutcome
// ---------------------------------------------------------------------------

/// Summary of one export run, for operator reporting only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Total article count advertised by the store.
    pub reported_total: u64,
    /// Entries actually returned and considered.
    pub considered: usize,
    /// Entries rendered into the book.
    pub accepted: usize,
    /// Entries skipped by the filter.
    pub skipped: usize,
    /// Where the book was written.
    pub output_path: PathBuf,
}
