//! Export filter: keeps entries with enough content to make a chapter.
//!
//! Short entries are usually failed content extractions (paywalls, video
//! pages, placeholders) and would produce near-empty chapters.

use wallabook_shared::{DEFAULT_MIN_CONTENT_LENGTH, Entry};

/// An entry the filter rejected, with what the operator needs to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub id: u64,
    pub title: String,
    /// Content length in bytes.
    pub content_len: usize,
}

/// Outcome of [`ExportFilter::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Skip(SkippedEntry),
}

/// Length-threshold filter. Only `content` is consulted.
#[derive(Debug, Clone, Copy)]
pub struct ExportFilter {
    min_content_length: usize,
}

impl ExportFilter {
    /// Entries must have strictly more than `min_content_length` bytes of content.
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }

    pub fn evaluate(&self, entry: &Entry) -> Decision {
        let len = entry.content_len();
        if len > self.min_content_length {
            Decision::Accept
        } else {
            Decision::Skip(SkippedEntry {
                id: entry.id,
                title: entry.title.clone(),
                content_len: len,
            })
        }
    }
}

impl Default for ExportFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONTENT_LENGTH)
    }
}
