//! Book assembler.
//!
//! Collects rendered sections into a [`Book`] in arrival order. No
//! reordering, merging or deduplication: two entries with the same title
//! become two chapters.

use tracing::trace;

use wallabook_shared::{Book, Section};

/// Accumulates sections for a single export run.
#[derive(Debug)]
pub struct BookAssembler {
    book: Book,
}

impl BookAssembler {
    /// Start a book with the run's title and author.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            book: Book::new(title, author),
        }
    }

    /// Append a chapter after all previously appended ones.
    pub fn append(&mut self, section: Section) {
        trace!(heading = %section.heading, position = self.book.len() + 1, "appending section");
        self.book.sections.push(section);
    }

    pub fn len(&self) -> usize {
        self.book.len()
    }

    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    /// Hand over the finished book.
    pub fn finish(self) -> Book {
        self.book
    }
}
