//! Core export pipeline for Wallabook.
//!
//! This crate ties together the article store, the export filter, chapter
//! rendering, book assembly and the EPUB writer into a single run
//! (see [`pipeline::run`]).

pub mod assembler;
pub mod filter;
pub mod pipeline;
pub mod render;
