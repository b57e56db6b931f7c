//! Edit application for injections.
//!
//! The transform never builds output text by concatenation. It records
//! insertions against the original source and hands them to
//! `ByteRangeRewriter`, which applies them from the end of the text backwards
//! and refuses overlapping or out-of-range edits.

mod rewriter;

pub use rewriter::{ByteRangeRewriter, Edit, EditBuilder, RewriteError};
