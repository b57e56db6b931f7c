//! Utilities module for callsplice.
//!
//! This module provides small helpers shared by the transform and the commands.

mod paths;

pub use paths::{collect_source_files, expand_targets, is_excluded, normalize_display_path};

/// A utility struct to convert byte offsets to line numbers.
///
/// Matches are located by byte offset, but injections are reported with
/// line numbers which are more human-readable.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source for newlines.
    /// Uses byte iteration since '\n' is always a single byte in UTF-8.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Byte offset where the line holding `offset` starts.
    #[must_use]
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_index(offset) - 1]
    }
}

/// Leading spaces and tabs of the line that holds `offset`.
#[must_use]
pub fn indentation_at<'s>(source: &'s str, index: &LineIndex, offset: usize) -> &'s str {
    let start = index.line_start(offset);
    let line = &source[start..];
    let width = line
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    &line[..width]
}
